use gtk4 as gtk;
use gtk4::{gdk, gdk_pixbuf, gio};
use std::cell::Cell;
use std::rc::Rc;

/// Ticket counter for a widget whose image can be replaced before the
/// previous fetch lands. Only the newest ticket may apply its texture.
#[derive(Debug, Clone, Default)]
pub struct LatestRequest(Rc<Cell<u64>>);

impl LatestRequest {
    pub fn next(&self) -> u64 {
        let ticket = self.0.get().wrapping_add(1);
        self.0.set(ticket);
        ticket
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.0.get() == ticket
    }
}

/// Fetch a remote image and hand the decoded texture to `apply` on the main
/// loop. Failures only log; the widget keeps its placeholder.
pub fn load_texture<F>(http: reqwest::Client, url: &str, apply: F)
where
    F: FnOnce(gdk::Texture) + 'static,
{
    if url.trim().is_empty() {
        return;
    }
    let url = url.to_string();
    let url_for_log = url.clone();
    crate::utils::run_async_to_main(
        async move {
            let resp = http.get(&url).send().await?.error_for_status()?;
            Ok::<Vec<u8>, reqwest::Error>(resp.bytes().await?.to_vec())
        },
        move |res: Result<Vec<u8>, reqwest::Error>| match res {
            Ok(data) => {
                let bytes = gtk::glib::Bytes::from_owned(data);
                let stream = gio::MemoryInputStream::from_bytes(&bytes);
                match gdk_pixbuf::Pixbuf::from_stream(&stream, gio::Cancellable::NONE) {
                    Ok(pixbuf) => apply(gdk::Texture::for_pixbuf(&pixbuf)),
                    Err(e) => log::debug!("Could not decode image {url_for_log}: {e}"),
                }
            }
            Err(e) => log::debug!("Could not fetch image {url_for_log}: {e}"),
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_newest_ticket_is_current() {
        let latest = LatestRequest::default();
        let first = latest.next();
        assert!(latest.is_current(first));

        let second = latest.clone().next();
        assert!(!latest.is_current(first));
        assert!(latest.is_current(second));
    }
}

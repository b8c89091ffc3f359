//! OPML subscription list parsing.
//!
//! The feed list is configured as an OPML document. Every `outline`
//! element carrying an `xmlUrl` attribute is a feed subscription, at
//! any nesting depth; outlines without one are folders and are
//! skipped. `title` falls back to `text`, then to the URL itself.
//! An `imageUrl` attribute, when present, supplies the feed's default
//! item image.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{FeedscoutError, Result};
use crate::feed::types::FeedMetadata;

/// Parse an OPML document into the configured feed list.
pub fn parse_opml(xml: &str) -> Result<Vec<FeedMetadata>> {
    let mut reader = Reader::from_str(xml);
    let mut feeds = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"outline" =>
            {
                let mut xml_url = None;
                let mut title = None;
                let mut text = None;
                let mut description = None;
                let mut image_url = None;

                for attr in e.attributes() {
                    let attr = attr
                        .map_err(|e| FeedscoutError::Config(format!("invalid OPML: {}", e)))?;
                    let value = attr
                        .unescape_value()
                        .map_err(|e| FeedscoutError::Config(format!("invalid OPML: {}", e)))?
                        .into_owned();
                    match attr.key.as_ref() {
                        b"xmlUrl" => xml_url = Some(value),
                        b"title" => title = Some(value),
                        b"text" => text = Some(value),
                        b"description" => description = Some(value),
                        b"imageUrl" => image_url = Some(value),
                        _ => {}
                    }
                }

                // Outlines without xmlUrl are folders.
                let Some(url) = xml_url.filter(|u| !u.is_empty()) else {
                    continue;
                };
                let title = title
                    .or(text)
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| url.clone());

                let mut metadata = FeedMetadata::new(url, title);
                if let Some(description) = description {
                    metadata = metadata.with_description(description);
                }
                if let Some(image_url) = image_url.filter(|u| !u.is_empty()) {
                    metadata = metadata.with_default_image_url(image_url);
                }
                feeds.push(metadata);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(FeedscoutError::Config(format!("invalid OPML: {}", e)));
            }
        }
    }

    Ok(feeds)
}

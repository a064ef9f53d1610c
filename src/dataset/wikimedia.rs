//! Wikimedia XML dump reader
//!
//! Streams `<page>` elements out of a (possibly bzip2-compressed) Wikimedia
//! XML dump. Multistream dumps are concatenated bzip2 streams, so the
//! decoder keeps going past the first end-of-stream marker.

use super::source::{DatasetError, DumpSource, RawPage, SkipCounts};
use bzip2::read::MultiBzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Wikimedia XML dump source
pub struct WikimediaSource {
    name: String,
    reader: Reader<Box<dyn BufRead + Send>>,
    /// None = every namespace
    allowed_namespaces: Option<HashSet<i32>>,
    skipped: SkipCounts,
}

/// Partial page being built from XML events
#[derive(Debug, Default)]
struct PartialPage {
    title: Option<String>,
    id: Option<String>,
    namespace: Option<i32>,
    text: Option<String>,
    redirect: bool,
}

/// Result of parsing a page from the XML stream
enum ParseResult {
    Page(RawPage),
    Skipped,
    Eof,
}

impl WikimediaSource {
    /// Open a dump file; `.bz2` files are decompressed on the fly
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let is_bz2 = path.extension().map(|e| e == "bz2").unwrap_or(false);

        let inner: Box<dyn Read + Send> = if is_bz2 {
            Box::new(MultiBzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "wikimedia dump".to_string());
        Ok(Self::from_reader(name, inner))
    }

    /// Read uncompressed XML from any reader
    pub fn from_reader(name: impl Into<String>, inner: impl Read + Send + 'static) -> Self {
        let buffered: Box<dyn BufRead + Send> =
            Box::new(BufReader::with_capacity(1024 * 1024, inner));
        Self {
            name: name.into(),
            reader: Reader::from_reader(buffered),
            allowed_namespaces: Some(HashSet::from([0])),
            skipped: SkipCounts::default(),
        }
    }

    /// Set allowed namespaces; an empty list allows every namespace
    pub fn with_namespaces(mut self, namespaces: &[i32]) -> Self {
        self.allowed_namespaces = if namespaces.is_empty() {
            None
        } else {
            Some(namespaces.iter().copied().collect())
        };
        self
    }

    fn xml_error(&self, e: impl std::fmt::Display) -> DatasetError {
        DatasetError::XmlParse {
            source_name: self.name.clone(),
            message: format!("{} (at byte {})", e, self.reader.buffer_position()),
        }
    }

    /// Parse the next page from the XML stream
    fn parse_next_page(&mut self) -> Result<ParseResult, DatasetError> {
        let mut buf = Vec::with_capacity(8192);
        let mut text_buf = String::new();
        let mut current_element: Option<String> = None;
        let mut current_page: Option<PartialPage> = None;

        loop {
            buf.clear();
            let event = match self.reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => return Err(self.xml_error(e)),
            };

            match event {
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    match name.as_str() {
                        "page" => current_page = Some(PartialPage::default()),
                        "redirect" => {
                            if let Some(ref mut page) = current_page {
                                page.redirect = true;
                            }
                        }
                        "title" | "id" | "ns" | "text" => {
                            current_element = Some(name);
                            text_buf.clear();
                        }
                        _ => {}
                    }
                }
                // <redirect title="..."/> and <text deleted="deleted"/>
                Event::Empty(ref e) => {
                    if e.name().as_ref() == b"redirect" {
                        if let Some(ref mut page) = current_page {
                            page.redirect = true;
                        }
                    }
                }
                Event::Text(ref e) => {
                    if current_element.is_some() {
                        let text = e.unescape().map_err(|err| self.xml_error(err))?;
                        text_buf.push_str(&text);
                    }
                }
                Event::CData(ref e) => {
                    if current_element.is_some() {
                        text_buf.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => {
                    let name = e.name();
                    if name.as_ref() == b"page" {
                        if let Some(page) = current_page.take() {
                            return Ok(self.page_to_raw(page));
                        }
                        continue;
                    }
                    let Some(ref mut page) = current_page else {
                        continue;
                    };
                    match name.as_ref() {
                        b"title" => page.title = Some(std::mem::take(&mut text_buf)),
                        b"id" => {
                            // The page ID precedes revision and contributor IDs
                            if page.id.is_none() {
                                page.id = Some(std::mem::take(&mut text_buf));
                            }
                        }
                        b"ns" => page.namespace = text_buf.trim().parse().ok(),
                        b"text" => page.text = Some(std::mem::take(&mut text_buf)),
                        _ => {}
                    }
                    current_element = None;
                }
                Event::Eof => return Ok(ParseResult::Eof),
                _ => {}
            }
        }
    }

    /// Apply the namespace and redirect filters
    fn page_to_raw(&mut self, page: PartialPage) -> ParseResult {
        let namespace = page.namespace.unwrap_or(0);
        if let Some(ref allowed) = self.allowed_namespaces {
            if !allowed.contains(&namespace) {
                self.skipped.namespace += 1;
                return ParseResult::Skipped;
            }
        }

        let (Some(title), Some(id)) = (page.title, page.id) else {
            self.skipped.missing_text += 1;
            return ParseResult::Skipped;
        };
        let Some(wikitext) = page.text.filter(|t| !t.is_empty()) else {
            self.skipped.missing_text += 1;
            return ParseResult::Skipped;
        };

        if page.redirect || is_redirect_text(&wikitext) {
            self.skipped.redirects += 1;
            return ParseResult::Skipped;
        }

        ParseResult::Page(RawPage {
            id,
            title,
            namespace,
            wikitext,
        })
    }
}

/// `#REDIRECT [[Target]]`, any case
fn is_redirect_text(wikitext: &str) -> bool {
    wikitext
        .get(..9)
        .map(|head| head.eq_ignore_ascii_case("#redirect"))
        .unwrap_or(false)
}

impl DumpSource for WikimediaSource {
    fn iter_pages(&mut self) -> Box<dyn Iterator<Item = Result<RawPage, DatasetError>> + '_> {
        Box::new(WikimediaIterator {
            source: self,
            done: false,
        })
    }

    fn skipped(&self) -> SkipCounts {
        self.skipped
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Iterator over pages in a Wikimedia dump
struct WikimediaIterator<'a> {
    source: &'a mut WikimediaSource,
    done: bool,
}

impl<'a> Iterator for WikimediaIterator<'a> {
    type Item = Result<RawPage, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.source.parse_next_page() {
                Ok(ParseResult::Page(page)) => return Some(Ok(page)),
                Ok(ParseResult::Skipped) => continue,
                Ok(ParseResult::Eof) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

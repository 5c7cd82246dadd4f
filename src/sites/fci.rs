//! FCI breed nomenclature extractor
//!
//! Listing pages group breeds into sections; each breed anchor carries its
//! FCI number in parentheses, e.g. `BRIARD (113)`, and links to a detail
//! page with labelled spans for name, section and country of origin.

use crate::crawler::FetchResponse;
use crate::extract::{collect_links, resolve_link, ExtractError, Extractor};
use crate::storage::{ItemStub, Record};
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Default entry point of the FCI nomenclature
pub const FCI_ROOT_URL: &str = "http://www.fci.be/en/nomenclature/";

const GROUP_LINKS: &str = r#"div[class*="group"] > a[href]"#;
const BREED_ANCHORS: &str = r#"td[class*="race"] a[class*="nom"]"#;
const NAME: &str = "span#ContentPlaceHolder1_NomEnLabel";
const SECTION: &str = "span#ContentPlaceHolder1_SectionLabel";
const COUNTRY: &str = "span#ContentPlaceHolder1_PaysOrigineLabel";
const THUMB: &str = "img#ContentPlaceHolder1_IllustrationsRepeater_Image1_0";
const STANDARD_PDF: &str = "a#ContentPlaceHolder1_StandardENHyperLink";
const PROVISIONAL_DATE: &str = "span#ContentPlaceHolder1_DateReconnaissanceProvisoireLabel";
const STATUS: &str = "span#ContentPlaceHolder1_StatutLabel";

/// A parsed FCI page together with the URL relative links resolve against
pub struct FciPage {
    pub url: Url,
    pub document: Html,
}

/// Extractor for www.fci.be
pub struct FciExtractor {
    refid: Regex,
    group_links: Selector,
    breed_anchors: Selector,
    name: Selector,
    section: Selector,
    country: Selector,
    thumb: Selector,
    standard_pdf: Selector,
    provisional_date: Selector,
    status: Selector,
}

impl FciExtractor {
    /// Compiles the selectors used on FCI pages
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            refid: Regex::new(r"\((\d+)\)")?,
            group_links: selector(GROUP_LINKS)?,
            breed_anchors: selector(BREED_ANCHORS)?,
            name: selector(NAME)?,
            section: selector(SECTION)?,
            country: selector(COUNTRY)?,
            thumb: selector(THUMB)?,
            standard_pdf: selector(STANDARD_PDF)?,
            provisional_date: selector(PROVISIONAL_DATE)?,
            status: selector(STATUS)?,
        })
    }

    fn parse_refid(&self, text: &str) -> Option<String> {
        self.refid
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl Extractor for FciExtractor {
    type Page = FciPage;

    fn decode(&self, response: &FetchResponse) -> Result<FciPage, ExtractError> {
        Ok(FciPage {
            url: Url::parse(&response.url)?,
            document: Html::parse_document(&response.text()),
        })
    }

    fn discover_links(&self, page: &FciPage) -> Result<Vec<String>, ExtractError> {
        Ok(collect_links(
            &page.document,
            &self.group_links,
            "href",
            &page.url,
        ))
    }

    fn discover_items(&self, page: &FciPage) -> Result<Vec<ItemStub>, ExtractError> {
        let mut items = Vec::new();

        for anchor in page.document.select(&self.breed_anchors) {
            let text: String = anchor.text().collect();

            let Some(refid) = self.parse_refid(&text) else {
                tracing::debug!(
                    "No FCI number in breed anchor {:?} on {}",
                    text.trim(),
                    page.url
                );
                continue;
            };

            let Some(url) = anchor
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, &page.url))
            else {
                tracing::debug!("Breed {} on {} has no detail link", refid, page.url);
                continue;
            };

            items.push(ItemStub::new(refid, url));
        }

        Ok(items)
    }

    fn complete_item(&self, stub: ItemStub, detail: &FciPage) -> Result<Record, ExtractError> {
        let document = &detail.document;

        let name =
            select_text(document, &self.name).ok_or_else(|| ExtractError::MissingField {
                refid: stub.refid.clone(),
                field: "name".to_string(),
            })?;

        let mut record = stub.into_record();
        record.set("name", Some(name));
        record.set("section", select_text(document, &self.section));
        record.set("country", select_text(document, &self.country));
        record.set("thumb", select_url(document, &self.thumb, "src", &detail.url));
        record.set(
            "pdf",
            select_url(document, &self.standard_pdf, "href", &detail.url),
        );

        let status = select_text(document, &self.status).unwrap_or_default();
        if status.contains("provisional") {
            record.set(
                "provisional",
                select_text(document, &self.provisional_date),
            );
        }

        Ok(record)
    }
}

fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::Selector(css.to_string()))
}

/// Direct text of all matching elements, each fragment trimmed and joined by spaces
///
/// Text inside nested child elements is not included.
fn select_text(document: &Html, selector: &Selector) -> Option<String> {
    let text = document
        .select(selector)
        .flat_map(|element| element.children())
        .filter_map(|node| node.value().as_text())
        .map(|text| text.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// First matching element's attribute, resolved against the page URL
fn select_url(
    document: &Html,
    selector: &Selector,
    attr: &str,
    base_url: &Url,
) -> Option<String> {
    document
        .select(selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .and_then(|value| resolve_link(value, base_url))
}

//! Catalog extraction from rendered listing pages.
//!
//! Stateless: every call parses the HTML it is given. Selectors come from the
//! `selectors` section of the app config so markup changes on the site can be
//! followed without a rebuild.

use ::scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::domain::error::DomainError;
use crate::domain::model::{Animation, Character};
use crate::infrastructure::config::SelectorConfig;

/// One product card on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Card {
    id: String,
    name: String,
    url: String,
}

pub struct PageScraper {
    character_card: Selector,
    animation_card: Selector,
    card_name: Selector,
    card_link: Selector,
    next_page: Selector,
    id_attribute: String,
}

fn compile(name: &str, selector: &str) -> Result<Selector, DomainError> {
    Selector::parse(selector).map_err(|e| {
        DomainError::Config(format!(
            "Invalid selector {} ({:?}): {}",
            name, selector, e
        ))
    })
}

impl PageScraper {
    pub fn from_config(selectors: &SelectorConfig) -> Result<Self, DomainError> {
        Ok(Self {
            character_card: compile("character_card", &selectors.character_card)?,
            animation_card: compile("animation_card", &selectors.animation_card)?,
            card_name: compile("card_name", &selectors.card_name)?,
            card_link: compile("card_link", &selectors.card_link)?,
            next_page: compile("next_page", &selectors.next_page)?,
            id_attribute: selectors.id_attribute.clone(),
        })
    }

    /// Characters listed on a page.
    pub fn characters(&self, html: &str, page_url: &str) -> Vec<Character> {
        self.cards(html, &self.character_card, page_url)
            .into_iter()
            .map(|card| Character {
                id: card.id,
                name: card.name,
                page_url: card.url,
            })
            .collect()
    }

    /// Animations listed on a page.
    pub fn animations(&self, html: &str, page_url: &str) -> Vec<Animation> {
        self.cards(html, &self.animation_card, page_url)
            .into_iter()
            .map(|card| Animation {
                id: card.id,
                name: card.name,
                page_url: card.url,
            })
            .collect()
    }

    /// Absolute URL of the next listing page, if the pager offers one.
    pub fn next_page(&self, html: &str, page_url: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let href = document
            .select(&self.next_page)
            .find_map(|link| link.value().attr("href"))?;
        resolve(page_url, href)
    }

    fn cards(&self, html: &str, card_selector: &Selector, page_url: &str) -> Vec<Card> {
        let document = Html::parse_document(html);
        let mut cards = Vec::new();

        for element in document.select(card_selector) {
            match self.card(element, page_url) {
                Some(card) => cards.push(card),
                None => tracing::trace!("Skipping card without id or name"),
            }
        }

        tracing::debug!("Scraped {} cards from {}", cards.len(), page_url);
        cards
    }

    fn card(&self, element: ElementRef<'_>, page_url: &str) -> Option<Card> {
        let href = element
            .select(&self.card_link)
            .find_map(|link| link.value().attr("href"))
            .or_else(|| element.value().attr("href"));

        let name = element
            .select(&self.card_name)
            .next()
            .map(|name| name.text().collect::<String>())
            .or_else(|| element.value().attr("title").map(str::to_string))?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let id = element
            .value()
            .attr(&self.id_attribute)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| href.and_then(last_segment))?;

        let url = href
            .and_then(|href| resolve(page_url, href))
            .unwrap_or_else(|| page_url.to_string());

        Some(Card {
            id,
            name: name.to_string(),
            url,
        })
    }
}

fn resolve(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    match Url::parse(base) {
        Ok(base) => base.join(href).ok().map(String::from),
        Err(_) => Url::parse(href).ok().map(String::from),
    }
}

/// Last non-empty path segment of a link, ignoring query and fragment.
fn last_segment(href: &str) -> Option<String> {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

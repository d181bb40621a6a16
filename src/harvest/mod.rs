use anyhow::{anyhow, Context, Result};
use chrono::Local;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::extract::{
    self, clean_amount, folder_name, normalize_relative_date, FieldProbe, RetryPolicy,
};
use crate::fetch::BrowserSession;
use crate::models::{ListingSummary, SellerKind, NOT_AVAILABLE, PRICE_UNSPECIFIED};
use crate::politeness::Politeness;
use crate::sink::CsvTable;
use crate::sites::{ExtraSource, LinkRule, Pagination, SellerRule, SiteProfile};

/// Drives one site's search pages and emits summary records in DOM order.
///
/// Sequence ids start at 1 and increment only when a listing extracts
/// successfully, so the ids in the output table are dense. The listing DOM
/// is re-captured after every navigation side effect instead of caching
/// element handles.
pub struct ListingHarvester<'a> {
    session: &'a BrowserSession,
    profile: &'static SiteProfile,
    politeness: Politeness,
    retry: RetryPolicy,
}

impl<'a> ListingHarvester<'a> {
    pub fn new(session: &'a BrowserSession, profile: &'static SiteProfile) -> Self {
        Self {
            session,
            profile,
            politeness: Politeness::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_politeness(mut self, politeness: Politeness) -> Self {
        self.politeness = politeness;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Harvest up to `pages` search pages.
    ///
    /// A page that never shows its listing container is abandoned with a
    /// diagnostic; if that happens on the very first page the whole run is
    /// an error.
    pub async fn harvest(&self, pages: u32) -> Result<Vec<ListingSummary>> {
        let mut summaries = Vec::new();
        let mut counter: u32 = 1;

        for page_index in 0..pages.max(1) {
            let Some(url) = self.profile.pagination.page_url(page_index) else {
                break;
            };
            if page_index > 0 {
                self.politeness.pause().await;
            }
            info!("Scraping {} page {}: {}", self.profile.name, page_index + 1, url);

            if let Err(e) = self.prepare_page(&url) {
                if page_index == 0 {
                    return Err(anyhow!(e).context("first listing page never became usable"));
                }
                error!("Abandoning page {}: {}", page_index + 1, e);
                break;
            }

            let before = summaries.len();
            match self.profile.listing.link {
                LinkRule::Navigate => {
                    self.harvest_by_navigation(&mut summaries, &mut counter)
                        .await?;
                }
                LinkRule::Attr(_) => {
                    let doc = self.session.snapshot()?;
                    summaries.extend(summaries_from_page(&doc, self.profile, &mut counter));
                }
            }
            let found = summaries.len() - before;
            if found == 0 {
                if page_index == 0 {
                    return Err(anyhow!(
                        "no listings found on {}, selectors may be stale",
                        url
                    ));
                }
                warn!("No listings on page {}, stopping", page_index + 1);
                break;
            }
            info!("{} listings harvested from page {}", found, page_index + 1);
        }

        Ok(summaries)
    }

    /// Load the page, wait for the listing container, run the pagination
    /// gesture the profile asks for.
    fn prepare_page(&self, url: &str) -> Result<(), crate::fetch::FetchError> {
        self.session.load(url)?;
        self.session
            .wait_for_default(self.profile.listing.container)?;
        if self.profile.listing.scroll_after_load {
            self.session.scroll_to_bottom()?;
        }
        if let Pagination::InfiniteScroll { max_scrolls, .. } = self.profile.pagination {
            self.scroll_until_settled(max_scrolls)?;
        }
        Ok(())
    }

    /// Scroll-and-measure until the page height stabilizes or the cap is
    /// reached.
    fn scroll_until_settled(&self, max_scrolls: u32) -> Result<(), crate::fetch::FetchError> {
        let mut last_height = self.session.body_height()?;
        for _ in 0..max_scrolls {
            self.session.scroll_viewport_step()?;
            let height = self.session.body_height()?;
            if height == last_height {
                break;
            }
            last_height = height;
        }
        Ok(())
    }

    /// Cards that only navigate on click: resolve each link through the
    /// address bar, then re-acquire the card by index from a fresh snapshot;
    /// the old handles are invalid after coming back.
    async fn harvest_by_navigation(
        &self,
        summaries: &mut Vec<ListingSummary>,
        counter: &mut u32,
    ) -> Result<()> {
        let item_count = {
            let doc = self.session.snapshot()?;
            count_items(&doc, self.profile.listing.item)
        };
        info!("{} cards on the page", item_count);

        for idx in 0..item_count {
            if idx > 0 {
                self.politeness.pause().await;
            }
            match self.harvest_one_by_navigation(idx, *counter) {
                Ok(summary) => {
                    summaries.push(summary);
                    *counter += 1;
                }
                Err(e) => {
                    warn!("Skipping listing at index {}: {}", idx, e);
                }
            }
        }
        Ok(())
    }

    fn harvest_one_by_navigation(&self, idx: usize, sequence_id: u32) -> Result<ListingSummary> {
        let item_selector = self.profile.listing.item;

        let clicked = self.session.click_nth(item_selector, idx)?;
        if !clicked {
            return Err(anyhow!("card {} was not clickable", idx));
        }
        let link = self.session.current_url();
        self.session.back()?;
        self.session
            .wait_for_default(self.profile.listing.container)?;

        // The card may re-render a few times after back-navigation.
        let card_html = self
            .retry
            .run(|| {
                let doc = self.session.snapshot().ok()?;
                let sel = Selector::parse(item_selector).ok()?;
                doc.select(&sel).nth(idx).map(|el| el.html())
            })
            .context("card vanished after back-navigation")?;

        let fragment = Html::parse_fragment(&card_html);
        Ok(summary_from_card(
            fragment.root_element(),
            link,
            self.profile,
            sequence_id,
        ))
    }
}

fn count_items(doc: &Html, item_selector: &str) -> usize {
    Selector::parse(item_selector)
        .map(|sel| doc.select(&sel).count())
        .unwrap_or(0)
}

/// Extract every summary on an already-captured page. Cards without a
/// resolvable link are logged and skipped without consuming an id.
pub fn summaries_from_page(
    doc: &Html,
    profile: &'static SiteProfile,
    counter: &mut u32,
) -> Vec<ListingSummary> {
    let Ok(item_sel) = Selector::parse(profile.listing.item) else {
        return Vec::new();
    };
    let mut summaries = Vec::new();
    for (idx, card) in doc.select(&item_sel).enumerate() {
        let link = match profile.listing.link {
            LinkRule::Attr(probe) => extract::probe(card, &probe).map(|h| profile.absolutize(&h)),
            // Navigation-resolved sites never take this path.
            LinkRule::Navigate => None,
        };
        let Some(link) = link else {
            warn!("Card {} exposes no link, skipping", idx);
            continue;
        };
        summaries.push(summary_from_card(card, link, profile, *counter));
        *counter += 1;
    }
    summaries
}

/// Build one summary record from a card scope. Field misses degrade to
/// sentinels; this function itself never fails.
pub fn summary_from_card(
    card: ElementRef<'_>,
    link: String,
    profile: &'static SiteProfile,
    sequence_id: u32,
) -> ListingSummary {
    let rules = &profile.listing;

    let title = extract::probe_or_na(card, &rules.title);

    let price = match rules.price.as_ref().and_then(|p| extract::probe(card, p)) {
        Some(raw) if profile.numeric_price => clean_amount(&raw).to_string(),
        Some(raw) => raw,
        None => PRICE_UNSPECIFIED.to_string(),
    };

    let published = match rules.published.as_ref().and_then(|p| extract::probe(card, p)) {
        Some(raw) => normalize_relative_date(&raw, Local::now()),
        None => NOT_AVAILABLE.to_string(),
    };

    let (seller, seller_name) = classify_seller(card, &rules.seller);

    let extras = rules
        .extras
        .iter()
        .map(|extra| {
            let value = match &extra.source {
                ExtraSource::Dom(probe) => extract::probe_or_na(card, probe),
                ExtraSource::LinkCapture(pattern) => capture_from_link(&link, pattern),
            };
            (extra.column.to_string(), value)
        })
        .collect();

    ListingSummary {
        sequence_id,
        image_folder: folder_name(&title, sequence_id),
        title,
        price,
        published,
        link,
        seller,
        seller_name,
        extras,
    }
}

fn classify_seller(card: ElementRef<'_>, rule: &SellerRule) -> (SellerKind, Option<String>) {
    match *rule {
        SellerRule::BadgePresence(selector) => {
            let present = Selector::parse(selector)
                .map(|sel| card.select(&sel).next().is_some())
                .unwrap_or(false);
            if present {
                (SellerKind::Professional, None)
            } else {
                (SellerKind::Individual, None)
            }
        }
        SellerRule::TextMarker(marker) => {
            if extract::element_text(card).contains(marker) {
                (SellerKind::Professional, None)
            } else {
                (SellerKind::Individual, None)
            }
        }
        SellerRule::NamedElement(selector) => {
            match extract::probe(card, &FieldProbe::Css(selector)) {
                Some(name) => (SellerKind::Professional, Some(name)),
                None => (SellerKind::Individual, None),
            }
        }
        SellerRule::Unknown => (SellerKind::Individual, None),
    }
}

fn capture_from_link(link: &str, pattern: &str) -> String {
    Regex::new(pattern)
        .ok()
        .and_then(|re| {
            re.captures(link)
                .and_then(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        })
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Harvest a site and overwrite its listings table.
pub async fn run(
    session: &BrowserSession,
    profile: &'static SiteProfile,
    pages: u32,
    data_root: &Path,
    politeness: Politeness,
) -> Result<(PathBuf, usize)> {
    let harvester = ListingHarvester::new(session, profile).with_politeness(politeness);
    let summaries = harvester.harvest(pages).await?;

    let table = CsvTable::new(
        listings_path(data_root, profile),
        profile.listing_columns,
        profile.csv_delimiter,
    );
    let rows: Vec<_> = summaries.iter().map(ListingSummary::to_row).collect();
    table.overwrite(&rows)?;
    Ok((table.path().to_path_buf(), summaries.len()))
}

pub fn listings_path(data_root: &Path, profile: &SiteProfile) -> PathBuf {
    data_root
        .join(profile.name)
        .join(format!("{}_listings.csv", profile.name))
}

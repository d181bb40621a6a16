pub mod normalize;
pub mod retry;

pub use normalize::{clean_amount, folder_name, normalize_relative_date};
pub use retry::RetryPolicy;

use scraper::{ElementRef, Selector};

use crate::models::NOT_AVAILABLE;

/// A declarative way to pull one field out of a DOM scope. Site profiles are
/// tables of these, so per-site differences live in data instead of code.
#[derive(Debug, Clone, Copy)]
pub enum FieldProbe {
    /// Text of the first match.
    Css(&'static str),
    /// Attribute value of the first match.
    CssAttr(&'static str, &'static str),
    /// Text of the nth match (0-based).
    Nth(&'static str, usize),
    /// Last text fragment of the nth match: cards that stack an icon above
    /// the label expose the label as the final text node.
    NthLastLine(&'static str, usize),
    /// Text of the first match containing one of the markers.
    TextAmong(&'static str, &'static [&'static str]),
    /// Text of the first match that reads as a model year.
    YearLike(&'static str),
}

fn parse_selector(raw: &str) -> Option<Selector> {
    Selector::parse(raw).ok()
}

/// Element text with internal whitespace collapsed.
pub fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last non-empty text fragment of an element.
fn element_last_fragment(el: ElementRef<'_>) -> Option<String> {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .last()
        .map(|t| t.to_string())
}

fn looks_like_year(token: &str) -> bool {
    token.len() == 4
        && token.chars().all(|c| c.is_ascii_digit())
        && (token.starts_with("19") || token.starts_with("20"))
}

/// Run one probe against a scope. `None` means the field is absent; callers
/// decide between retrying and the sentinel.
pub fn probe(scope: ElementRef<'_>, probe: &FieldProbe) -> Option<String> {
    match probe {
        FieldProbe::Css(sel) => {
            let sel = parse_selector(sel)?;
            scope
                .select(&sel)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
        }
        FieldProbe::CssAttr(sel, attr) => {
            let sel = parse_selector(sel)?;
            scope
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr(attr))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        FieldProbe::Nth(sel, n) => {
            let sel = parse_selector(sel)?;
            scope
                .select(&sel)
                .nth(*n)
                .map(element_text)
                .filter(|t| !t.is_empty())
        }
        FieldProbe::NthLastLine(sel, n) => {
            let sel = parse_selector(sel)?;
            scope.select(&sel).nth(*n).and_then(element_last_fragment)
        }
        FieldProbe::TextAmong(sel, markers) => {
            let sel = parse_selector(sel)?;
            scope
                .select(&sel)
                .map(element_text)
                .find(|t| markers.iter().any(|m| t.contains(m)))
        }
        FieldProbe::YearLike(sel) => {
            let sel = parse_selector(sel)?;
            scope
                .select(&sel)
                .map(element_text)
                .flat_map(|t| {
                    t.split_whitespace()
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .find(|token| looks_like_year(token))
        }
    }
}

/// Probe with a fallback value.
pub fn probe_or(scope: ElementRef<'_>, p: &FieldProbe, fallback: &str) -> String {
    probe(scope, p).unwrap_or_else(|| fallback.to_string())
}

/// Probe with the standard sentinel.
pub fn probe_or_na(scope: ElementRef<'_>, p: &FieldProbe) -> String {
    probe_or(scope, p, NOT_AVAILABLE)
}

/// Texts of every match, empty entries dropped.
pub fn all_texts(scope: ElementRef<'_>, selector: &str) -> Vec<String> {
    let Some(sel) = parse_selector(selector) else {
        return Vec::new();
    };
    scope
        .select(&sel)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Attribute values of every match, empty entries dropped.
pub fn all_attrs(scope: ElementRef<'_>, selector: &str, attr: &str) -> Vec<String> {
    let Some(sel) = parse_selector(selector) else {
        return Vec::new();
    };
    scope
        .select(&sel)
        .filter_map(|el| el.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn doc(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    #[test]
    fn css_probe_collapses_whitespace() {
        let html = doc("<div><p class='t'>  Dacia\n  Logan </p></div>");
        let got = probe(html.root_element(), &FieldProbe::Css("p.t"));
        assert_eq!(got.as_deref(), Some("Dacia Logan"));
    }

    #[test]
    fn missing_element_yields_none_and_sentinel() {
        let html = doc("<div></div>");
        assert_eq!(probe(html.root_element(), &FieldProbe::Css("p.t")), None);
        assert_eq!(probe_or_na(html.root_element(), &FieldProbe::Css("p.t")), "N/A");
    }

    #[test]
    fn nth_last_line_takes_the_label_under_the_icon() {
        let html = doc(
            "<span class='f'><i>icon</i> Automatique</span>\
             <span class='f'><i>icon</i> Diesel</span>",
        );
        let got = probe(html.root_element(), &FieldProbe::NthLastLine("span.f", 1));
        assert_eq!(got.as_deref(), Some("Diesel"));
    }

    #[test]
    fn text_among_finds_the_marked_span() {
        let html = doc("<span>120 000 km</span><span>Hybride</span>");
        let got = probe(
            html.root_element(),
            &FieldProbe::TextAmong("span", &["Essence", "Diesel", "Hybride", "Électrique"]),
        );
        assert_eq!(got.as_deref(), Some("Hybride"));
    }

    #[test]
    fn year_like_skips_prices() {
        let html = doc("<span>75 000 DH</span><span>2019</span>");
        let got = probe(html.root_element(), &FieldProbe::YearLike("span"));
        assert_eq!(got.as_deref(), Some("2019"));
    }

    #[test]
    fn all_attrs_reads_the_gallery() {
        let html = doc("<img src='a.jpg'><img src='b.jpg'><img>");
        let got = all_attrs(html.root_element(), "img", "src");
        assert_eq!(got, vec!["a.jpg", "b.jpg"]);
    }
}

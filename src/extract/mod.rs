//! Document Extractor: parse semi-structured HTML benefit documents into
//! atomic [`BenefitRow`]s.
//!
//! Tables are the primary shape: the first cell of a data row is the
//! service name, and remaining columns map to payers via the header row.
//! Multi-tier text inside a cell is exploded into per-tier rows. A
//! heading/paragraph fallback handles documents without tables.
//! Malformed or missing tables yield an empty extraction, never an error.

pub mod aliases;
pub mod tiers;
pub mod walk;

use anyhow::{Context, Result};
use scraper::{ElementRef, Html};
use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::models::{BenefitRow, Payer, Tier};
use aliases::payer_from_text;
use tiers::{clean_text, explode_tiers};
use walk::{scan_ancestry, DocNode};

/// Static filename → category mapping for the known benefit documents.
const FILE_CATEGORY_MAP: &[(&str, &str)] = &[
    ("optometry_services.html", "אופטומטריה"),
    ("communication_clinic_services.html", "מרפאות תקשורת"),
    ("dental_services.html", "מרפאות שיניים"),
    ("alternative_services.html", "רפואה משלימה"),
    ("pregnancy_services.html", "שירותי הריון"),
    ("workshops_services.html", "סדנאות בריאות"),
];

/// Extract benefit rows from every `.html` file in a directory.
pub fn load_kb(dir: &Path) -> Result<Vec<BenefitRow>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("KB dir not found: {}", dir.display()))?;

    let mut rows = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let html = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        rows.extend(extract_html(&html, &source));
    }
    Ok(rows)
}

/// Extract benefit rows from a single HTML document.
pub fn extract_html(html: &str, source: &str) -> Vec<BenefitRow> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();
    let category = category_for(source, root);

    let mut rows = Vec::new();
    let tables = elements_named(root, &["table"]);

    for table in &tables {
        extract_table(*table, &category, source, &mut rows);
    }
    if tables.is_empty() {
        extract_without_tables(root, &category, source, &mut rows);
    }

    dedup_rows(rows)
}

fn extract_table(
    table: ElementRef<'_>,
    category: &str,
    source: &str,
    rows: &mut Vec<BenefitRow>,
) {
    let trs = elements_named(table, &["tr"]);

    // Map each data column to a payer via the header row; column 0 is the
    // service name.
    let mut col_payer: HashMap<usize, Payer> = HashMap::new();
    if let Some(first_tr) = trs.first() {
        let header_texts: Vec<String> = elements_named(*first_tr, &["th"])
            .iter()
            .map(|th| element_text(*th))
            .collect();
        if header_texts.len() >= 2 {
            for (j, header) in header_texts.iter().enumerate().skip(1) {
                if let Some(payer) = payer_from_text(header) {
                    col_payer.insert(j, payer);
                }
            }
        }
    }

    for tr in &trs {
        let ths = elements_named(*tr, &["th"]);
        let tds = elements_named(*tr, &["td"]);
        if !ths.is_empty() && tds.is_empty() {
            continue; // header row
        }
        if tds.is_empty() {
            continue;
        }

        let mut service = element_text(tds[0]);
        if service.is_empty() {
            service = category.to_string();
        }

        if !col_payer.is_empty() {
            // One record per payer column.
            for (j, td) in tds.iter().enumerate().skip(1) {
                let body = element_text(*td);
                if body.is_empty() {
                    continue;
                }
                let payer = col_payer.get(&j).copied().unwrap_or(Payer::Unknown);
                push_segments(rows, category, &service, payer, &body, source);
            }
        } else {
            // No payer columns detected: combine the row body and try to
            // attribute a payer from the text itself or a nearby heading.
            let body = if tds.len() > 1 {
                clean_text(
                    &tds[1..]
                        .iter()
                        .map(|td| element_text(*td))
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            } else {
                String::new()
            };
            let payer = payer_from_text(&body)
                .or_else(|| nearest_payer_heading(*tr))
                .unwrap_or(Payer::Unknown);
            push_segments(rows, category, &service, payer, &body, source);
        }
    }
}

/// Fallback for documents without tables: scan headings, paragraphs and
/// list items sequentially, tracking the current payer from headings.
fn extract_without_tables(
    root: ElementRef<'_>,
    category: &str,
    source: &str,
    rows: &mut Vec<BenefitRow>,
) {
    let mut current_payer = Payer::Unknown;
    for el in elements_named(root, &["h1", "h2", "h3", "h4", "strong", "b", "p", "li"]) {
        let text = element_text(el);
        if let Some(payer) = payer_from_text(&text) {
            current_payer = payer;
            continue;
        }
        let name = el.value().name();
        if (name == "p" || name == "li") && !text.is_empty() {
            let (service, detail) = match text.split_once(':') {
                Some((svc, det)) => (clean_text(svc), det.to_string()),
                None => (category.to_string(), text),
            };
            push_segments(rows, category, &service, current_payer, &detail, source);
        }
    }
}

fn push_segments(
    rows: &mut Vec<BenefitRow>,
    category: &str,
    service: &str,
    payer: Payer,
    body: &str,
    source: &str,
) {
    for segment in explode_tiers(body) {
        rows.push(BenefitRow {
            category: category.to_string(),
            service: service.to_string(),
            payer,
            tier: segment.tier,
            text: segment.text,
            source: source.to_string(),
        });
    }
}

/// Drop empty-text rows and deduplicate by the full six-field tuple,
/// preserving first-seen order.
fn dedup_rows(rows: Vec<BenefitRow>) -> Vec<BenefitRow> {
    let mut seen: HashSet<BenefitRow> = HashSet::new();
    rows.into_iter()
        .filter(|r| !r.text.is_empty())
        .filter(|r| seen.insert(r.clone()))
        .collect()
}

fn category_for(source: &str, root: ElementRef<'_>) -> String {
    for (file, category) in FILE_CATEGORY_MAP {
        if *file == source {
            return category.to_string();
        }
    }
    let title = elements_named(root, &["title"])
        .first()
        .map(|t| element_text(*t))
        .unwrap_or_default();
    if !title.is_empty() {
        return title;
    }
    let stem = source.strip_suffix(".html").unwrap_or(source);
    clean_text(&stem.replace('_', " "))
}

// ─── Markup-tree helpers ─────────────────────────────────

fn elements_named<'a>(root: ElementRef<'a>, names: &[&str]) -> Vec<ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| names.contains(&el.value().name()))
        .collect()
}

fn element_text(el: ElementRef<'_>) -> String {
    clean_text(&el.text().collect::<Vec<_>>().join(" "))
}

#[derive(Clone)]
struct HtmlNode<'a>(ElementRef<'a>);

impl DocNode for HtmlNode<'_> {
    fn text_content(&self) -> String {
        element_text(self.0)
    }
    fn prev_siblings(&self) -> Vec<Self> {
        self.0
            .prev_siblings()
            .filter_map(ElementRef::wrap)
            .map(HtmlNode)
            .collect()
    }
    fn parent(&self) -> Option<Self> {
        self.0.parent().and_then(ElementRef::wrap).map(HtmlNode)
    }
}

fn nearest_payer_heading(el: ElementRef<'_>) -> Option<Payer> {
    scan_ancestry(&HtmlNode(el), |text| payer_from_text(text))
}

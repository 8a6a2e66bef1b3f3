// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types: pages of an edition and the hotspot regions they own.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::region::{NormalizedRect, READER_LABEL_FALLBACK};

/// Identifier of an e-paper page, assigned by the page store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

impl PageId {
    /// Fresh store-side identifier (`ep-<uuid>`).
    pub fn generate() -> Self {
        Self(format!("ep-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a region. Timestamp-derived and immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub String);

impl RegionId {
    /// `region-<unix millis>-<8 hex>`.
    ///
    /// The random suffix keeps ids distinct when two regions are created
    /// within the same millisecond.
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("region-{millis}-{}", &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RegionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an editor or clip session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A clickable rectangle on a page image.
///
/// Coordinates are percentages (0–100) of the image's natural dimensions,
/// never pixels. The serialized form is the persisted wire shape:
/// `{id, x, y, width, height, articleId?, title}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: RegionId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_id: Option<String>,
    #[serde(default)]
    pub title: String,
}

impl Region {
    /// Build a region with a fresh id from a normalized rectangle.
    pub fn new(rect: NormalizedRect, article_id: Option<String>, title: String) -> Self {
        Self {
            id: RegionId::generate(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            article_id: article_id.filter(|id| !id.trim().is_empty()),
            title,
        }
    }

    pub fn rect(&self) -> NormalizedRect {
        NormalizedRect {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }

    /// Zero-area regions are kept but should be flagged by the UI.
    pub fn is_degenerate(&self) -> bool {
        self.rect().is_degenerate()
    }

    /// Label shown on the reader tooltip.
    pub fn label(&self) -> &str {
        if self.title.trim().is_empty() {
            READER_LABEL_FALLBACK
        } else {
            &self.title
        }
    }
}

/// One scanned page of an edition together with its hotspots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    /// Edition date.
    pub date: NaiveDate,
    /// Positive, unique within `date`.
    pub page_number: u32,
    pub image_url: String,
    /// Insertion order is preserved across round-trips.
    #[serde(default)]
    pub regions: Vec<Region>,
    pub created_at: DateTime<Utc>,
}

impl Page {
    /// Look up a region by id.
    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    /// Number of regions on the page.
    pub fn hotspot_count(&self) -> usize {
        self.regions.len()
    }

    /// A copy of this page carrying `regions` instead of the current list.
    pub fn with_regions(&self, regions: Vec<Region>) -> Self {
        Self {
            regions,
            ..self.clone()
        }
    }
}

/// Request to add a page to an edition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPage {
    pub date: NaiveDate,
    pub page_number: u32,
    pub image_url: String,
}

impl NewPage {
    /// A page for today's edition.
    pub fn today(page_number: u32, image_url: impl Into<String>) -> Self {
        Self {
            date: Utc::now().date_naive(),
            page_number,
            image_url: image_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_region(article_id: Option<&str>) -> Region {
        Region {
            id: RegionId::from("region-1"),
            x: 10.0,
            y: 12.5,
            width: 20.0,
            height: 15.0,
            article_id: article_id.map(str::to_owned),
            title: "Ad".into(),
        }
    }

    #[test]
    fn region_wire_shape_omits_missing_article() {
        let json = serde_json::to_value(sample_region(None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "region-1", "x": 10.0, "y": 12.5,
                "width": 20.0, "height": 15.0, "title": "Ad"
            })
        );
    }

    #[test]
    fn region_wire_shape_uses_camel_case_article_id() {
        let json = serde_json::to_value(sample_region(Some("art-7"))).unwrap();
        assert_eq!(json["articleId"], "art-7");
        assert!(json.get("article_id").is_none());
    }

    #[test]
    fn legacy_region_without_title_parses() {
        let region: Region =
            serde_json::from_str(r#"{"id":"r","x":1,"y":2,"width":3,"height":4}"#).unwrap();
        assert_eq!(region.title, "");
        assert_eq!(region.label(), READER_LABEL_FALLBACK);
        assert!(region.article_id.is_none());
    }

    #[test]
    fn empty_article_id_is_treated_as_absent() {
        let rect = NormalizedRect {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        };
        let region = Region::new(rect, Some(String::new()), "Manual".into());
        assert!(region.article_id.is_none());
    }

    #[test]
    fn generated_region_ids_are_distinct() {
        let a = RegionId::generate();
        let b = RegionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("region-"));
    }

    #[test]
    fn page_date_serializes_as_iso_calendar_date() {
        let page = Page {
            id: PageId::from("ep-0"),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            page_number: 1,
            image_url: "pages/1.png".into(),
            regions: vec![sample_region(None)],
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["date"], "2024-01-01");
        let back: Page = serde_json::from_value(json).unwrap();
        assert_eq!(back, page);
    }
}

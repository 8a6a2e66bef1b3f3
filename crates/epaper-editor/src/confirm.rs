// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Confirmation seam for destructive editor actions.

use async_trait::async_trait;
use chrono::NaiveDate;

use epaper_core::types::{PageId, RegionId};

/// A destructive action awaiting the editor's go-ahead.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmRequest {
    DeleteRegion {
        page_id: PageId,
        region_id: RegionId,
        title: String,
    },
    DeletePage {
        page_id: PageId,
        date: NaiveDate,
        page_number: u32,
    },
}

impl ConfirmRequest {
    /// Prompt text for a yes/no dialog.
    pub fn prompt(&self) -> String {
        match self {
            Self::DeleteRegion { title, .. } => format!("Remove this region ({title})?"),
            Self::DeletePage {
                date, page_number, ..
            } => format!("Delete page {page_number} of the {date} edition?"),
        }
    }
}

/// Asks the user whether a destructive action should go ahead.
///
/// Plain closures work: `&|_: &ConfirmRequest| true`.
#[async_trait]
pub trait Confirmation: Send + Sync {
    async fn confirm(&self, request: &ConfirmRequest) -> bool;
}

#[async_trait]
impl<F> Confirmation for F
where
    F: Fn(&ConfirmRequest) -> bool + Send + Sync,
{
    async fn confirm(&self, request: &ConfirmRequest) -> bool {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_name_the_target() {
        let region = ConfirmRequest::DeleteRegion {
            page_id: PageId::from("ep-1"),
            region_id: RegionId::from("region-1"),
            title: "Ad".into(),
        };
        assert_eq!(region.prompt(), "Remove this region (Ad)?");

        let page = ConfirmRequest::DeletePage {
            page_id: PageId::from("ep-1"),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            page_number: 3,
        };
        assert_eq!(page.prompt(), "Delete page 3 of the 2024-01-01 edition?");
    }

    #[tokio::test]
    async fn closures_answer_requests() {
        let request = ConfirmRequest::DeleteRegion {
            page_id: PageId::from("ep-1"),
            region_id: RegionId::from("region-1"),
            title: "Ad".into(),
        };
        let yes: &dyn Confirmation = &|_: &ConfirmRequest| true;
        let no: &dyn Confirmation = &|_: &ConfirmRequest| false;
        assert!(yes.confirm(&request).await);
        assert!(!no.confirm(&request).await);
    }
}

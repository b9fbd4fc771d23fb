//! Aggregates for contributor and public dashboards.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::config::InventoryConfig;
use crate::error::{Error, Result};
use crate::ledger::{current_lines, InventoryAlerts};
use crate::model::{
    Account, Collection, Contributor, Distribution, NeedStatus, Supplier, Urgency,
    VerificationStatus, Victim, VictimNeeds,
};
use crate::storage::{document, Storage};

const WELCOME: &str = "Welcome to ResQLink API";
const RECENT_ALERTS: usize = 5;

/// Identity block of [`ContributorStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorSummary {
    /// Display name.
    pub name: String,
    /// Contributor id.
    pub contributor_id: String,
    /// Review state.
    pub verification_status: VerificationStatus,
    /// Collections logged.
    pub total_collections: u64,
    /// Distributions logged.
    pub total_distributions: u64,
}

/// Ledger totals of [`ContributorStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    /// Sum of collected quantities.
    pub total_items_collected: f64,
    /// Sum of current inventory.
    pub total_items_in_stock: f64,
    /// Sum of distributed quantities.
    pub total_items_distributed: f64,
    /// Households reached.
    pub total_families_benefited: u64,
    /// Collection records.
    pub collections_count: usize,
    /// Inventory lines.
    pub inventory_items_count: usize,
    /// Distribution records.
    pub distributions_count: usize,
    /// Lines below threshold.
    pub low_stock_alerts: usize,
    /// Lines near expiry.
    pub expiring_soon_alerts: usize,
}

/// A contributor's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorStats {
    /// Who.
    pub contributor: ContributorSummary,
    /// What they have handled.
    pub stats: LedgerTotals,
}

/// Dashboard numbers for one contributor.
///
/// Alert counts come from freshly computed flags.
///
/// # Errors
///
/// Returns [`Error::NotFound`] for an unknown contributor.
pub fn contributor_stats(
    storage: &Storage,
    config: InventoryConfig,
    contributor_id: &str,
) -> Result<ContributorStats> {
    let (contributor, collections, lines, distributions) = storage.write(|tx| {
        let contributor = document::get::<Account<Contributor>>(tx, contributor_id)?
            .ok_or_else(|| Error::not_found("Contributor not found"))?
            .profile;
        let collections: Vec<Collection> = document::list_by_owner(tx, contributor_id)?;
        let lines = current_lines(tx, config, contributor_id)?;
        let distributions: Vec<Distribution> = document::list_by_owner(tx, contributor_id)?;
        Ok((contributor, collections, lines, distributions))
    })?;

    let alerts = InventoryAlerts::count(&lines);
    let stats = LedgerTotals {
        total_items_collected: collections.iter().map(Collection::total_quantity).sum(),
        total_items_in_stock: lines.iter().map(|l| l.current_quantity).sum(),
        total_items_distributed: distributions.iter().map(Distribution::total_quantity).sum(),
        total_families_benefited: distributions
            .iter()
            .filter_map(|d| d.families_benefited)
            .map(u64::from)
            .sum(),
        collections_count: collections.len(),
        inventory_items_count: lines.len(),
        distributions_count: distributions.len(),
        low_stock_alerts: alerts.low_stock,
        expiring_soon_alerts: alerts.expiring_soon,
    };
    debug!(contributor_id, "Computed contributor stats");

    Ok(ContributorStats {
        contributor: ContributorSummary {
            name: contributor.name,
            contributor_id: contributor.contributor_id,
            verification_status: contributor.verification_status,
            total_collections: contributor.total_collections,
            total_distributions: contributor.total_distributions,
        },
        stats,
    })
}

/// Counters on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeCounts {
    /// Registered victims.
    pub families_affected: i64,
    /// Registered suppliers.
    pub active_suppliers: i64,
    /// Distinct districts victims registered from.
    pub districts_covered: usize,
}

/// A recently registered victim, as shown in the home page ticker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAlert {
    /// Victim id.
    pub victim_id: String,
    /// Victim's district.
    pub district: String,
    /// Requested item labels, empty if no needs were submitted.
    pub needs: Vec<&'static str>,
    /// Urgency of the need request, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Urgency>,
}

/// Public home page payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeStats {
    /// Greeting.
    pub message: &'static str,
    /// Counters.
    pub stats: HomeCounts,
    /// Newest registrations first.
    pub recent_alerts: Vec<RecentAlert>,
}

/// Public counters plus the five newest victims.
///
/// # Errors
///
/// Returns a storage error.
pub fn home_stats(storage: &Storage) -> Result<HomeStats> {
    storage.read(|conn| {
        let victims: Vec<Account<Victim>> = document::list_all(conn)?;
        let districts: BTreeSet<String> = victims
            .iter()
            .map(|a| a.profile.district.trim().to_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        let recent: Vec<Account<Victim>> = document::list_recent(conn, RECENT_ALERTS)?;
        let mut recent_alerts = Vec::with_capacity(recent.len());
        for account in recent {
            let needs: Option<VictimNeeds> = document::get(conn, &account.profile.victim_id)?;
            recent_alerts.push(RecentAlert {
                victim_id: account.profile.victim_id,
                district: account.profile.district,
                needs: needs.as_ref().map(|n| n.items.labels()).unwrap_or_default(),
                urgency: needs.map(|n| n.urgency),
            });
        }

        Ok(HomeStats {
            message: WELCOME,
            stats: HomeCounts {
                families_affected: i64::try_from(victims.len()).unwrap_or(i64::MAX),
                active_suppliers: document::count::<Account<Supplier>>(conn)?,
                districts_covered: districts.len(),
            },
            recent_alerts,
        })
    })
}

/// Headline numbers for the public dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Victims with an open need request.
    pub total_flooded: usize,
    /// Contributors not rejected by an admin.
    pub active_volunteers: usize,
    /// Open critical requests.
    pub urgent_requests: usize,
}

/// Dashboard counters computed from the stored records.
///
/// # Errors
///
/// Returns a storage error.
pub fn dashboard_stats(storage: &Storage) -> Result<DashboardStats> {
    storage.read(|conn| {
        let needs: Vec<VictimNeeds> = document::list_all(conn)?;
        let open: Vec<&VictimNeeds> = needs
            .iter()
            .filter(|n| n.status != NeedStatus::Resolved)
            .collect();
        let contributors: Vec<Account<Contributor>> = document::list_all(conn)?;

        Ok(DashboardStats {
            total_flooded: open.len(),
            active_volunteers: contributors
                .iter()
                .filter(|c| c.profile.verification_status != VerificationStatus::Rejected)
                .count(),
            urgent_requests: open
                .iter()
                .filter(|n| n.urgency == Urgency::Critical)
                .count(),
        })
    })
}

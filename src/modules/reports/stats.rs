use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::{
    modules::families::{Family, FamilyStatus, SubsidyType, round_cents},
    store::MockStore,
};

pub const TREND_MONTHS: u32 = 6;

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: FamilyStatus,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct RegionStats {
    pub region: String,
    pub families: usize,
    pub approved: usize,
    pub approved_monthly_subsidy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubsidyTypeStats {
    pub subsidy_type: SubsidyType,
    pub label: &'static str,
    pub families: usize,
    pub approved: usize,
    pub approved_monthly_subsidy: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthCount {
    pub month: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportOverview {
    pub region: Option<String>,
    pub total_families: usize,
    pub total_persons: usize,
    pub by_status: Vec<StatusCount>,
    pub regions: Vec<RegionStats>,
    pub subsidy_types: Vec<SubsidyTypeStats>,
    pub approved_monthly_subsidy: f64,
    pub average_per_capita_income: f64,
    pub monthly_applications: Vec<MonthCount>,
    pub pending_messages: usize,
    pub published_announcements: usize,
    pub generated_at: DateTime<Utc>,
}

/// Families in `region`, or all of them when no region is given.
pub fn families_in<'a>(families: &'a [Family], region: Option<&str>) -> Vec<&'a Family> {
    let region = region.map(str::trim).filter(|value| !value.is_empty());
    families
        .iter()
        .filter(|family| region.is_none_or(|region| family.region == region))
        .collect()
}

pub fn build_overview(
    store: &MockStore,
    region: Option<&str>,
    now: DateTime<Utc>,
) -> ReportOverview {
    let families = families_in(store.families.all(), region);

    let by_status = FamilyStatus::ALL
        .iter()
        .map(|&status| StatusCount {
            status,
            label: status.label_zh(),
            count: families.iter().filter(|f| f.status == status).count(),
        })
        .collect();

    let subsidy_types = SubsidyType::ALL
        .iter()
        .map(|&kind| {
            let matching: Vec<&Family> = families
                .iter()
                .copied()
                .filter(|f| f.subsidy_type == kind)
                .collect();
            SubsidyTypeStats {
                subsidy_type: kind,
                label: kind.label_zh(),
                families: matching.len(),
                approved: matching.iter().filter(|f| is_approved(f)).count(),
                approved_monthly_subsidy: approved_total(&matching),
            }
        })
        .collect();

    let average_per_capita_income = if families.is_empty() {
        0.0
    } else {
        let sum: f64 = families.iter().map(|f| f.per_capita_income()).sum();
        round_cents(sum / families.len() as f64)
    };

    ReportOverview {
        region: region
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
        total_families: families.len(),
        total_persons: families.iter().map(|f| f.household_size()).sum(),
        by_status,
        regions: region_stats(&families),
        subsidy_types,
        approved_monthly_subsidy: approved_total(&families),
        average_per_capita_income,
        monthly_applications: monthly_applications(&families, now),
        pending_messages: store.messages.count_pending(),
        published_announcements: store.announcements.count_published(),
        generated_at: now,
    }
}

/// Per-region figures sorted by region name.
pub fn region_stats(families: &[&Family]) -> Vec<RegionStats> {
    let mut regions: BTreeMap<&str, RegionStats> = BTreeMap::new();
    for family in families {
        let entry = regions
            .entry(family.region.as_str())
            .or_insert_with(|| RegionStats {
                region: family.region.clone(),
                ..RegionStats::default()
            });
        entry.families += 1;
        if is_approved(family) {
            entry.approved += 1;
            entry.approved_monthly_subsidy += family.subsidy_amount;
        }
    }

    regions
        .into_values()
        .map(|mut stats| {
            stats.approved_monthly_subsidy = round_cents(stats.approved_monthly_subsidy);
            stats
        })
        .collect()
}

/// Applications per calendar month, oldest first, covering the current month and the five
/// before it.
pub fn monthly_applications(families: &[&Family], now: DateTime<Utc>) -> Vec<MonthCount> {
    let current = now.year() * 12 + now.month0() as i32;

    (0..TREND_MONTHS as i32)
        .rev()
        .map(|back| {
            let index = current - back;
            let (year, month0) = (index.div_euclid(12), index.rem_euclid(12));
            let count = families
                .iter()
                .filter(|f| f.created_at.year() == year && f.created_at.month0() as i32 == month0)
                .count();
            MonthCount {
                month: format!("{year:04}-{:02}", month0 + 1),
                count,
            }
        })
        .collect()
}

fn is_approved(family: &Family) -> bool {
    family.status == FamilyStatus::Approved
}

fn approved_total(families: &[&Family]) -> f64 {
    round_cents(
        families
            .iter()
            .filter(|f| is_approved(f))
            .map(|f| f.subsidy_amount)
            .sum(),
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::modules::families::{FamilyInput, MemberInput, ReviewAction};

    fn input(head: &str, id_number: &str, region: &str, income: f64, amount: f64) -> FamilyInput {
        FamilyInput {
            household_head: head.to_string(),
            id_number: id_number.to_string(),
            phone: "13900001111".to_string(),
            region: region.to_string(),
            address: String::new(),
            monthly_income: income,
            subsidy_type: SubsidyType::MinimumLiving,
            subsidy_amount: amount,
        }
    }

    fn sample_store(now: DateTime<Utc>) -> MockStore {
        let mut store = MockStore::empty();
        let families = &mut store.families;

        let a = families
            .create(input("甲", "110101199001010001", "东城街道", 1200.0, 500.0), now)
            .unwrap();
        families
            .add_member(
                a.id,
                MemberInput {
                    name: "甲妻".to_string(),
                    relation: "配偶".to_string(),
                    age: 35,
                },
                now,
            )
            .unwrap();
        families.review(a.id, ReviewAction::Approve, None, now).unwrap();

        let b = families
            .create(
                input("乙", "110101199001010002", "东城街道", 800.0, 300.0),
                now - Duration::days(70),
            )
            .unwrap();
        families.review(b.id, ReviewAction::Approve, None, now).unwrap();

        families
            .create(input("丙", "110101199001010003", "西城街道", 600.0, 200.0), now)
            .unwrap();
        store
    }

    #[test]
    fn overview_totals_cover_every_family() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        let store = sample_store(now);
        let overview = build_overview(&store, None, now);

        assert_eq!(overview.total_families, 3);
        assert_eq!(overview.total_persons, 4);
        assert_eq!(overview.approved_monthly_subsidy, 800.0);
        // (600 + 800 + 600) / 3
        assert!((overview.average_per_capita_income - 666.67).abs() < 1e-9);

        let approved = overview
            .by_status
            .iter()
            .find(|entry| entry.status == FamilyStatus::Approved)
            .unwrap();
        assert_eq!(approved.count, 2);

        assert_eq!(overview.regions.len(), 2);
        assert_eq!(overview.regions[0].region, "东城街道");
        assert_eq!(overview.regions[0].approved_monthly_subsidy, 800.0);
        assert_eq!(overview.regions[1].approved, 0);

        let minimum_living = &overview.subsidy_types[0];
        assert_eq!(minimum_living.families, 3);
        assert_eq!(minimum_living.approved, 2);
    }

    #[test]
    fn region_filter_narrows_every_figure() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        let store = sample_store(now);
        let overview = build_overview(&store, Some(" 西城街道 "), now);

        assert_eq!(overview.region.as_deref(), Some("西城街道"));
        assert_eq!(overview.total_families, 1);
        assert_eq!(overview.approved_monthly_subsidy, 0.0);
        assert_eq!(overview.regions.len(), 1);
    }

    #[test]
    fn monthly_trend_is_zero_filled_and_oldest_first() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        let store = sample_store(now);
        let families = families_in(store.families.all(), None);
        let trend = monthly_applications(&families, now);

        let months: Vec<&str> = trend.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(
            months,
            ["2023-10", "2023-11", "2023-12", "2024-01", "2024-02", "2024-03"]
        );
        assert_eq!(trend[3].count, 1);
        assert_eq!(trend[5].count, 2);
        assert_eq!(trend[0].count, 0);
    }

    #[test]
    fn empty_store_yields_zeroes() {
        let overview = build_overview(&MockStore::empty(), None, Utc::now());
        assert_eq!(overview.total_families, 0);
        assert_eq!(overview.average_per_capita_income, 0.0);
        assert_eq!(overview.monthly_applications.len(), TREND_MONTHS as usize);
        assert!(overview.regions.is_empty());
    }
}

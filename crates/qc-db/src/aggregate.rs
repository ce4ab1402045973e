//! Yield, histogram and calendar arithmetic over rows already loaded from the store.

use crate::models::{Shipment, ShippedUnit, UnitOutcome};
use itertools::Itertools;
use jiff::{civil::Date, ToSpan};
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_FPY_WEEKS: u32 = 6;
pub const MAX_FPY_WEEKS: u32 = 26;
const MONTHS_OVER_TIME: usize = 12;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage of units that passed their first test, rounded to two places. Zero when
/// there are no units at all.
pub fn first_pass_yield(passed: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(passed as f64 / total as f64 * 100.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ModelCount {
    pub model_type: String,
    pub count: i64,
}

pub fn model_summary<'a>(model_types: impl IntoIterator<Item = &'a str>) -> Vec<ModelCount> {
    model_types
        .into_iter()
        .counts()
        .into_iter()
        .sorted_unstable_by_key(|(model_type, _)| *model_type)
        .map(|(model_type, count)| ModelCount {
            model_type: model_type.to_owned(),
            count: count as i64,
        })
        .collect()
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ShipmentSummary {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub total_units: i64,
    pub shipped_units_summary: Vec<ModelCount>,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ShipmentPage {
    pub shipments: Vec<ShipmentSummary>,
    pub total_pages: i64,
    pub current_page: i64,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct ShipmentWithUnits {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub units: Vec<ShippedUnit>,
    pub total_units: usize,
    pub shipped_units_summary: Vec<ModelCount>,
}

impl ShipmentWithUnits {
    pub fn new(shipment: Shipment, units: Vec<ShippedUnit>) -> Self {
        let shipped_units_summary = model_summary(units.iter().map(|u| u.model_type.as_str()));
        Self {
            shipment,
            total_units: units.len(),
            units,
            shipped_units_summary,
        }
    }
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Narrows a shipment's units to the ones matching a manifest search. When no unit
/// matches but the shipment itself does (job number or customer), every unit is kept.
pub fn manifest_units(
    shipment: &Shipment,
    units: Vec<ShippedUnit>,
    search: Option<&str>,
) -> Vec<ShippedUnit> {
    let Some(term) = search else {
        return units;
    };
    let needle = term.to_lowercase();
    let unit_matches = |unit: &ShippedUnit| {
        contains_ignore_case(&unit.part_number, &needle)
            || contains_ignore_case(&unit.serial_number, &needle)
            || unit
                .original_serial_number
                .as_deref()
                .is_some_and(|s| contains_ignore_case(s, &needle))
            || contains_ignore_case(&unit.model_type, &needle)
    };
    if units.iter().any(unit_matches) {
        units.into_iter().filter(|u| unit_matches(u)).collect()
    } else if contains_ignore_case(&shipment.job_number, &needle)
        || contains_ignore_case(&shipment.customer_name, &needle)
    {
        units
    } else {
        Vec::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Product {
    PartNumber(String),
    ModelType(String),
}

impl Product {
    fn matches(&self, unit: &UnitOutcome) -> bool {
        match self {
            Product::PartNumber(part_number) => &unit.part_number == part_number,
            Product::ModelType(model_type) => &unit.model_type == model_type,
        }
    }
}

/// Chooses among candidates: the one equal to the needle, else the first when they all
/// agree ignoring case.
fn pick_candidate<'a>(lowered_needle: &str, candidates: &[&'a str]) -> Option<&'a str> {
    let lowered = candidates.iter().map(|c| c.to_lowercase()).collect_vec();
    if let Some(index) = lowered.iter().position(|c| c == lowered_needle) {
        return Some(candidates[index]);
    }
    if !lowered.is_empty() && lowered.iter().all_equal() {
        return candidates.first().copied();
    }
    None
}

/// Decides whether a dashboard search names a single product. Part numbers are tried
/// before model types, and exact matches before substring matches.
pub fn resolve_product(term: &str, units: &[UnitOutcome]) -> Option<Product> {
    let needle = term.to_lowercase();
    let part_numbers: BTreeSet<&str> = units.iter().map(|u| u.part_number.as_str()).collect();
    let model_types: BTreeSet<&str> = units.iter().map(|u| u.model_type.as_str()).collect();

    let exact_parts = part_numbers
        .iter()
        .copied()
        .filter(|p| p.to_lowercase() == needle)
        .collect_vec();
    if !exact_parts.is_empty() && exact_parts.iter().map(|p| p.to_lowercase()).all_equal() {
        return Some(Product::PartNumber(exact_parts[0].to_owned()));
    }

    let similar_parts = part_numbers
        .iter()
        .copied()
        .filter(|p| contains_ignore_case(p, &needle))
        .collect_vec();
    if let Some(part_number) = pick_candidate(&needle, &similar_parts) {
        return Some(Product::PartNumber(part_number.to_owned()));
    }

    let exact_models = model_types
        .iter()
        .copied()
        .filter(|m| m.to_lowercase() == needle)
        .collect_vec();
    if let [model_type] = exact_models.as_slice() {
        return Some(Product::ModelType((*model_type).to_owned()));
    }

    let similar_models = units
        .iter()
        .filter(|u| {
            contains_ignore_case(&u.model_type, &needle)
                || contains_ignore_case(&u.part_number, &needle)
        })
        .map(|u| u.model_type.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect_vec();
    pick_candidate(&needle, &similar_models).map(|m| Product::ModelType(m.to_owned()))
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RetestReasonCount {
    pub retest_reason: String,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EquipmentCount {
    pub equipment: String,
    pub count: usize,
}

fn ranked<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    labels
        .counts()
        .into_iter()
        .sorted_by(|(a_label, a_count), (b_label, b_count)| {
            b_count.cmp(a_count).then_with(|| a_label.cmp(b_label))
        })
        .map(|(label, count)| (label.to_owned(), count))
        .collect()
}

pub fn retest_reasons(units: &[UnitOutcome]) -> Vec<RetestReasonCount> {
    ranked(
        units
            .iter()
            .filter(|u| !u.first_test_pass)
            .filter_map(|u| u.retest_reason.as_deref())
            .flat_map(|reasons| reasons.split(','))
            .map(str::trim)
            .filter(|reason| !reason.is_empty()),
    )
    .into_iter()
    .map(|(retest_reason, count)| RetestReasonCount {
        retest_reason,
        count,
    })
    .collect()
}

pub fn failed_equipment(units: &[UnitOutcome]) -> Vec<EquipmentCount> {
    ranked(
        units
            .iter()
            .filter(|u| !u.first_test_pass)
            .filter_map(|u| u.failed_equipment.as_deref())
            .filter(|equipment| !equipment.trim().is_empty()),
    )
    .into_iter()
    .map(|(equipment, count)| EquipmentCount { equipment, count })
    .collect()
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct DashboardStats {
    pub total_shipments: usize,
    pub total_units_shipped: usize,
    pub first_pass_yield: f64,
    pub retest_reasons: Vec<RetestReasonCount>,
    pub failed_equipment_stats: Vec<EquipmentCount>,
}

pub fn dashboard_stats(
    total_shipments: usize,
    units: &[UnitOutcome],
    search: Option<&str>,
) -> DashboardStats {
    let passed = units.iter().filter(|u| u.first_test_pass).count();
    let mut fpy = first_pass_yield(passed, units.len());
    if let Some(product) = search.and_then(|term| resolve_product(term, units)) {
        let (narrowed, narrowed_passed) = units
            .iter()
            .filter(|u| product.matches(u))
            .fold((0, 0), |(total, passed), u| {
                (total + 1, passed + usize::from(u.first_test_pass))
            });
        if narrowed > 0 {
            fpy = first_pass_yield(narrowed_passed, narrowed);
        }
    }
    DashboardStats {
        total_shipments,
        total_units_shipped: units.len(),
        first_pass_yield: fpy,
        retest_reasons: retest_reasons(units),
        failed_equipment_stats: failed_equipment(units),
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct MonthlySeries {
    pub labels: Vec<String>,
    #[serde(rename = "totalUnits")]
    pub total_units: Vec<usize>,
    pub fpy: Vec<f64>,
}

/// Buckets `(shipping_date, first_test_pass)` pairs by month, keeping the most recent
/// twelve months in ascending order.
pub fn monthly_series(units: impl IntoIterator<Item = (Date, bool)>) -> MonthlySeries {
    let mut months: BTreeMap<(i16, i8), (usize, usize)> = BTreeMap::new();
    for (date, passed) in units {
        let (total, first_pass) = months.entry((date.year(), date.month())).or_default();
        *total += 1;
        if passed {
            *first_pass += 1;
        }
    }
    let mut series = MonthlySeries::default();
    let recent = months.into_iter().rev().take(MONTHS_OVER_TIME).collect_vec();
    for ((year, month), (total, first_pass)) in recent.into_iter().rev() {
        series.labels.push(format!("{year:04}-{month:02}"));
        series.total_units.push(total);
        series.fpy.push(first_pass_yield(first_pass, total));
    }
    series
}

/// Sunday on or before `date`.
pub fn week_start(date: Date) -> Date {
    date.saturating_sub(i64::from(date.weekday().to_sunday_zero_offset()).days())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct WeekRange {
    pub start: Date,
    pub end: Date,
}

impl WeekRange {
    /// The Sunday to Saturday week containing `date`.
    pub fn containing(date: Date) -> Self {
        let start = week_start(date);
        Self {
            start,
            end: start.saturating_add(6.days()),
        }
    }
}

pub fn clamp_weeks(requested: i64) -> u32 {
    requested.clamp(1, i64::from(MAX_FPY_WEEKS)) as u32
}

/// The run of weeks ending with the week containing the anchor date.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FpyWindow {
    pub anchor: WeekRange,
    pub weeks: u32,
}

impl FpyWindow {
    pub fn new(anchor_date: Date, weeks: u32) -> Self {
        Self {
            anchor: WeekRange::containing(anchor_date),
            weeks: weeks.clamp(1, MAX_FPY_WEEKS),
        }
    }

    /// Nth week counting back from the anchor week, which is week zero.
    pub fn week(&self, back: u32) -> WeekRange {
        let start = self
            .anchor
            .start
            .saturating_sub((7 * i64::from(back)).days());
        WeekRange {
            start,
            end: start.saturating_add(6.days()),
        }
    }

    pub fn first_day(&self) -> Date {
        self.week(self.weeks - 1).start
    }

    pub fn last_day(&self) -> Date {
        self.anchor.end
    }
}

#[derive(Clone, Debug)]
pub struct WeeklyUnit {
    pub shipping_date: Date,
    pub part_number: String,
    pub model_type: String,
    pub first_test_pass: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct ProductYield {
    pub part_number: String,
    pub model_type: String,
    pub total_units: usize,
    pub first_pass_units: usize,
    pub first_pass_yield: f64,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct YieldTotals {
    pub total_units: usize,
    pub first_pass_units: usize,
    pub first_pass_yield: f64,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct WeekYield {
    pub start: Date,
    pub end: Date,
    pub label: String,
    pub products: Vec<ProductYield>,
    pub totals: YieldTotals,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct WeeklyFpyReport {
    pub anchor_week_start: Date,
    pub anchor_week_end: Date,
    pub weeks_requested: u32,
    pub weeks: Vec<WeekYield>,
}

/// Per product yield for every week of the window, newest week first. Weeks without
/// any shipped units are still reported, with zeroed totals.
pub fn weekly_fpy(window: &FpyWindow, units: &[WeeklyUnit]) -> WeeklyFpyReport {
    // (week start, part number) -> (model type, total, first pass)
    let mut buckets: BTreeMap<(Date, &str), (&str, usize, usize)> = BTreeMap::new();
    for unit in units {
        let (_, total, first_pass) = buckets
            .entry((week_start(unit.shipping_date), unit.part_number.as_str()))
            .or_insert((unit.model_type.as_str(), 0, 0));
        *total += 1;
        if unit.first_test_pass {
            *first_pass += 1;
        }
    }

    let weeks = (0..window.weeks)
        .map(|back| {
            let range = window.week(back);
            let products = buckets
                .range((range.start, "")..)
                .take_while(|((week, _), _)| *week == range.start)
                .map(
                    |((_, part_number), (model_type, total, first_pass))| ProductYield {
                        part_number: (*part_number).to_owned(),
                        model_type: (*model_type).to_owned(),
                        total_units: *total,
                        first_pass_units: *first_pass,
                        first_pass_yield: first_pass_yield(*first_pass, *total),
                    },
                )
                .collect_vec();
            let total_units = products.iter().map(|p| p.total_units).sum();
            let first_pass_units = products.iter().map(|p| p.first_pass_units).sum();
            WeekYield {
                start: range.start,
                end: range.end,
                label: format!("{} to {}", range.start, range.end),
                products,
                totals: YieldTotals {
                    total_units,
                    first_pass_units,
                    first_pass_yield: first_pass_yield(first_pass_units, total_units),
                },
            }
        })
        .collect();

    WeeklyFpyReport {
        anchor_week_start: window.anchor.start,
        anchor_week_end: window.anchor.end,
        weeks_requested: window.weeks,
        weeks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn outcome(part_number: &str, model_type: &str, passed: bool) -> UnitOutcome {
        UnitOutcome {
            part_number: part_number.to_owned(),
            model_type: model_type.to_owned(),
            first_test_pass: passed,
            failed_equipment: None,
            retest_reason: None,
        }
    }

    fn failed(equipment: Option<&str>, reasons: Option<&str>) -> UnitOutcome {
        UnitOutcome {
            failed_equipment: equipment.map(str::to_owned),
            retest_reason: reasons.map(str::to_owned),
            ..outcome("PN-1", "Widget", false)
        }
    }

    fn shipment(job_number: &str, customer_name: &str) -> Shipment {
        Shipment {
            id: 1,
            customer_name: customer_name.to_owned(),
            job_number: job_number.to_owned(),
            shipping_date: date(2024, 3, 5).into(),
            qc_name: "Inspector".to_owned(),
            status: "In Progress".to_owned(),
        }
    }

    fn unit(unit_id: i32, model_type: &str, part_number: &str, serial_number: &str) -> ShippedUnit {
        ShippedUnit {
            unit_id,
            shipment_id: 1,
            model_type: model_type.to_owned(),
            part_number: part_number.to_owned(),
            serial_number: serial_number.to_owned(),
            original_serial_number: None,
            first_test_pass: true,
            failed_equipment: None,
            retest_reason: None,
        }
    }

    #[test]
    fn yield_of_no_units_is_zero() {
        assert_eq!(first_pass_yield(0, 0), 0.0);
        let stats = dashboard_stats(3, &[], Some("anything"));
        assert_eq!(stats.total_shipments, 3);
        assert_eq!(stats.total_units_shipped, 0);
        assert_eq!(stats.first_pass_yield, 0.0);
    }

    #[test]
    fn yield_is_rounded_to_two_places() {
        assert_eq!(first_pass_yield(2, 3), 66.67);
        assert_eq!(first_pass_yield(1, 8), 12.5);
        assert_eq!(first_pass_yield(5, 5), 100.0);
    }

    #[test]
    fn exact_part_number_wins_over_model_type() {
        let units = [
            outcome("ab-100", "AB", true),
            outcome("AB-1000", "AB", false),
            outcome("CD-1", "AB-100", false),
        ];
        assert_eq!(
            resolve_product("AB-100", &units),
            Some(Product::PartNumber("ab-100".to_owned()))
        );
    }

    #[test]
    fn substring_part_number_resolves_only_when_unambiguous() {
        let units = [outcome("XJ-200", "Pump", true), outcome("XJ-300", "Pump", true)];
        assert_eq!(resolve_product("XJ-2", &units), Some(Product::PartNumber("XJ-200".to_owned())));
        // Both part numbers contain "XJ" so the search falls through to model types,
        // where every matching unit is a "Pump".
        assert_eq!(resolve_product("xj", &units), Some(Product::ModelType("Pump".to_owned())));
    }

    #[test]
    fn exact_model_type_needs_a_single_spelling() {
        let units = [outcome("P1", "Valve", true), outcome("P2", "Valve", false)];
        assert_eq!(resolve_product("VALVE", &units), Some(Product::ModelType("Valve".to_owned())));

        let mixed = [outcome("P1", "Valve", true), outcome("P2", "VALVE", false)];
        // Two exact spellings is ambiguous, so the substring tier picks the first one.
        assert_eq!(resolve_product("valve", &mixed), Some(Product::ModelType("VALVE".to_owned())));
    }

    #[test]
    fn ambiguous_terms_do_not_narrow() {
        let units = [outcome("P1", "Valve", true), outcome("P2", "Valve Body", false)];
        assert_eq!(resolve_product("alv", &units), None);
        assert_eq!(resolve_product("nothing", &units), None);
    }

    #[test]
    fn dashboard_yield_is_narrowed_to_the_resolved_product() {
        let units = [
            outcome("PN-1", "Widget", true),
            outcome("PN-1", "Widget", false),
            outcome("PN-2", "Gadget", true),
            outcome("PN-2", "Gadget", true),
        ];
        let overall = dashboard_stats(2, &units, None);
        assert_eq!(overall.first_pass_yield, 75.0);
        let narrowed = dashboard_stats(2, &units, Some("pn-1"));
        assert_eq!(narrowed.first_pass_yield, 50.0);
        assert_eq!(narrowed.total_units_shipped, 4, "totals are never narrowed");
    }

    #[test]
    fn retest_reasons_are_split_and_counted_for_failed_units_only() {
        let units = [
            failed(Some("Hipot"), Some("Leak, Noise")),
            failed(Some("Hipot"), Some("Noise,,")),
            failed(Some("  "), Some("leak")),
            UnitOutcome {
                retest_reason: Some("Ignored".to_owned()),
                failed_equipment: Some("Ignored".to_owned()),
                ..outcome("PN-1", "Widget", true)
            },
        ];
        assert_eq!(
            retest_reasons(&units),
            vec![
                RetestReasonCount { retest_reason: "Noise".to_owned(), count: 2 },
                RetestReasonCount { retest_reason: "Leak".to_owned(), count: 1 },
                RetestReasonCount { retest_reason: "leak".to_owned(), count: 1 },
            ]
        );
        assert_eq!(
            failed_equipment(&units),
            vec![EquipmentCount { equipment: "Hipot".to_owned(), count: 2 }]
        );
    }

    #[test]
    fn monthly_series_keeps_the_latest_twelve_months_ascending() {
        let mut rows = Vec::new();
        for month in 1..=12 {
            rows.push((date(2023, month, 10), true));
        }
        rows.push((date(2024, 1, 2), true));
        rows.push((date(2024, 1, 30), false));
        let series = monthly_series(rows);
        assert_eq!(series.labels.len(), 12);
        assert_eq!(series.labels.first().map(String::as_str), Some("2023-02"));
        assert_eq!(series.labels.last().map(String::as_str), Some("2024-01"));
        assert_eq!(series.total_units.last(), Some(&2));
        assert_eq!(series.fpy.last(), Some(&50.0));
    }

    #[test]
    fn weeks_start_on_sunday() {
        // 2024-06-12 is a Wednesday.
        assert_eq!(week_start(date(2024, 6, 12)), date(2024, 6, 9));
        assert_eq!(week_start(date(2024, 6, 9)), date(2024, 6, 9));
        assert_eq!(week_start(date(2024, 6, 15)), date(2024, 6, 9));
        let range = WeekRange::containing(date(2024, 6, 12));
        assert_eq!(range.end, date(2024, 6, 15));
    }

    #[test]
    fn weeks_parameter_is_clamped() {
        assert_eq!(clamp_weeks(0), 1);
        assert_eq!(clamp_weeks(-4), 1);
        assert_eq!(clamp_weeks(40), 26);
        assert_eq!(clamp_weeks(8), 8);
        let window = FpyWindow::new(date(2024, 6, 12), 3);
        assert_eq!(window.first_day(), date(2024, 5, 26));
        assert_eq!(window.last_day(), date(2024, 6, 15));
    }

    #[test]
    fn weekly_report_without_data_still_lists_every_week() {
        let window = FpyWindow::new(date(2024, 6, 12), 4);
        let report = weekly_fpy(&window, &[]);
        assert_eq!(report.weeks_requested, 4);
        assert_eq!(report.weeks.len(), 4);
        for week in &report.weeks {
            assert!(week.products.is_empty());
            assert_eq!(week.totals, YieldTotals::default());
        }
        assert_eq!(report.weeks[0].label, "2024-06-09 to 2024-06-15");
        assert_eq!(report.weeks[3].start, date(2024, 5, 19));
    }

    #[test]
    fn weekly_report_groups_by_week_and_part_number() {
        let window = FpyWindow::new(date(2024, 6, 12), 2);
        let row = |d: Date, part: &str, passed: bool| WeeklyUnit {
            shipping_date: d,
            part_number: part.to_owned(),
            model_type: format!("Model {part}"),
            first_test_pass: passed,
        };
        let units = [
            row(date(2024, 6, 10), "B", true),
            row(date(2024, 6, 14), "A", false),
            row(date(2024, 6, 15), "A", true),
            row(date(2024, 6, 3), "A", true),
        ];
        let report = weekly_fpy(&window, &units);
        let newest = &report.weeks[0];
        assert_eq!(
            newest.products.iter().map(|p| p.part_number.as_str()).collect_vec(),
            ["A", "B"]
        );
        assert_eq!(newest.products[0].first_pass_yield, 50.0);
        assert_eq!(newest.products[0].model_type, "Model A");
        assert_eq!(newest.totals.total_units, 3);
        assert_eq!(newest.totals.first_pass_yield, 66.67);
        assert_eq!(report.weeks[1].totals.total_units, 1);
    }

    #[test]
    fn manifest_falls_back_to_all_units_when_the_shipment_matched() {
        let acme = shipment("J-100", "ACME Corp");
        let units = vec![unit(1, "Widget", "PN-1", "S-1"), unit(2, "Gadget", "PN-2", "S-2")];
        let shown = manifest_units(&acme, units.clone(), Some("acme"));
        assert_eq!(shown.len(), 2);

        let narrowed = manifest_units(&acme, units.clone(), Some("pn-2"));
        assert_eq!(narrowed.iter().map(|u| u.unit_id).collect_vec(), [2]);

        assert!(manifest_units(&acme, units.clone(), Some("zzz")).is_empty());
        assert_eq!(manifest_units(&acme, units, None).len(), 2);
    }

    #[test]
    fn summaries_count_units_per_model_type() {
        let with_units = ShipmentWithUnits::new(
            shipment("J-1", "Customer"),
            vec![
                unit(1, "Widget", "PN-1", "S-1"),
                unit(2, "Gadget", "PN-2", "S-2"),
                unit(3, "Widget", "PN-1", "S-3"),
            ],
        );
        assert_eq!(with_units.total_units, 3);
        assert_eq!(
            with_units.shipped_units_summary,
            vec![
                ModelCount { model_type: "Gadget".to_owned(), count: 1 },
                ModelCount { model_type: "Widget".to_owned(), count: 2 },
            ]
        );
    }

    #[test]
    fn summaries_serialize_flat_with_iso_dates() {
        let with_units = ShipmentWithUnits::new(
            shipment("J-1", "Customer"),
            vec![unit(1, "Widget", "PN-1", "S-1")],
        );
        let json = serde_json::to_value(&with_units).expect("should serialize");
        assert_eq!(json["job_number"], "J-1");
        assert_eq!(json["shipping_date"], "2024-03-05");
        assert_eq!(json["total_units"], 1);
        assert_eq!(json["units"][0]["serial_number"], "S-1");

        let series = serde_json::to_value(monthly_series([(date(2024, 1, 2), true)]))
            .expect("should serialize");
        assert_eq!(series["totalUnits"], serde_json::json!([1]));
    }
}

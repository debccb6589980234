//! Read-only spending projections.
//!
//! Pure functions over an item snapshot; recomputed by consumers on every
//! snapshot the item stream emits. Nothing here mutates or persists state.

use std::collections::HashMap;

use chrono::Weekday;
use serde::Serialize;

use crate::{Category, ShoppingItem};

/// Aggregated view of a snapshot: estimated spending per category and per
/// weekday, item counts per category, and the grand total.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SummaryReport {
    pub total_minor: i64,
    pub item_count: usize,
    pub totals_by_category: HashMap<Category, i64>,
    pub counts_by_category: HashMap<Category, usize>,
    pub totals_by_day: HashMap<Weekday, i64>,
}

impl SummaryReport {
    /// Projects a snapshot into its aggregates.
    ///
    /// Prices are clamped at zero the same way the ledger deltas clamp them,
    /// so the projection agrees with the balance arithmetic.
    pub fn project(items: &[ShoppingItem]) -> Self {
        let mut report = SummaryReport {
            item_count: items.len(),
            ..SummaryReport::default()
        };
        for item in items {
            let price = item.price_minor.max(0);
            report.total_minor += price;
            *report.totals_by_category.entry(item.category).or_insert(0) += price;
            *report.counts_by_category.entry(item.category).or_insert(0) += 1;
            *report.totals_by_day.entry(item.day_of_week).or_insert(0) += price;
        }
        report
    }
}

/// One slice of the category pie chart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CategoryArc {
    pub category: Category,
    pub total_minor: i64,
    pub start_angle: f32,
    pub sweep_angle: f32,
}

/// Converts category totals into pie-chart arcs.
///
/// Sweep is the category's share of the grand total scaled to 360 degrees,
/// laid out in [`Category::ALL`] order. A zero grand total yields no arcs:
/// there is nothing to normalize against.
pub fn category_arcs(report: &SummaryReport) -> Vec<CategoryArc> {
    if report.total_minor <= 0 {
        return Vec::new();
    }

    let mut arcs = Vec::new();
    let mut start_angle = 0.0_f32;
    for category in Category::ALL {
        let total = report
            .totals_by_category
            .get(&category)
            .copied()
            .unwrap_or(0);
        if total <= 0 {
            continue;
        }
        let sweep_angle = (total as f32 / report.total_minor as f32) * 360.0;
        arcs.push(CategoryArc {
            category,
            total_minor: total,
            start_angle,
            sweep_angle,
        });
        start_angle += sweep_angle;
    }
    arcs
}

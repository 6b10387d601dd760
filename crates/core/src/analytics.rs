//! Spend analytics over ordered requests.
//!
//! Callers holding [`Capability::ViewAllSpend`] see every requester's spend;
//! everyone else sees only requests they own. Aggregation here is pure; the
//! database layer loads the rows for a [`SpendScope`] and hands them over.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::negotiation::SavingsSummary;
use crate::policy::{Actor, Capability, Policy};
use crate::request::RequestStatus;

/// Items listed in the top-items table.
pub const TOP_ITEMS: usize = 5;
/// Months listed in the monthly spend series.
pub const MONTHS_SHOWN: usize = 6;
/// Look-back when the caller gives none.
pub const DEFAULT_WINDOW_DAYS: u32 = 90;
/// Longest look-back accepted.
pub const MAX_WINDOW_DAYS: u32 = 3650;

const SECONDS_PER_DAY: i64 = 86_400;

/// Whose requests an analytics query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpendScope {
    /// Every requester.
    Everyone,
    /// Only requests owned by this user.
    Owner(Uuid),
}

impl SpendScope {
    /// Scope granted to `actor`.
    #[must_use]
    pub fn for_actor(actor: &Actor) -> Self {
        if Policy::allows(actor.role, Capability::ViewAllSpend) {
            Self::Everyone
        } else {
            Self::Owner(actor.id)
        }
    }

    /// Owner filter to apply, if any.
    #[must_use]
    pub fn owner(self) -> Option<Uuid> {
        match self {
            Self::Everyone => None,
            Self::Owner(id) => Some(id),
        }
    }
}

/// Look-back window in days, clamped to `1..=MAX_WINDOW_DAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SpendWindow(u32);

impl SpendWindow {
    /// Window of `days`, or the default when absent.
    #[must_use]
    pub fn from_query(days: Option<u32>) -> Self {
        Self(days.unwrap_or(DEFAULT_WINDOW_DAYS).clamp(1, MAX_WINDOW_DAYS))
    }

    /// Days covered.
    #[must_use]
    pub fn days(self) -> u32 {
        self.0
    }

    /// Earliest creation time inside the window ending at `now`.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::days(i64::from(self.0))
    }
}

impl Default for SpendWindow {
    fn default() -> Self {
        Self(DEFAULT_WINDOW_DAYS)
    }
}

/// A request that reached a purchase order; the unit of spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedRequest {
    /// Request category.
    pub category: Option<String>,
    /// What was bought, falling back to the title.
    pub description: Option<String>,
    /// Units requested.
    pub quantity: Option<i32>,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// Vendor name on the order.
    pub vendor: String,
    /// Order total.
    pub total: Decimal,
    /// When the order was issued.
    pub ordered_at: DateTime<Utc>,
    /// When the goods arrived, if they did.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Delivery date promised in the contract.
    pub due_by: Option<DateTime<Utc>>,
}

/// A request as the dashboard counters see it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTally {
    /// Current status.
    pub status: RequestStatus,
    /// When the request was created.
    pub created_at: DateTime<Utc>,
    /// Order total, once a purchase order exists.
    pub order_total: Option<Decimal>,
}

/// Spend per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySpend {
    /// Category, `other` when unset.
    pub category: String,
    /// Summed order totals.
    pub amount: Decimal,
    /// Ordered requests.
    pub count: usize,
}

/// Spend per calendar month of request creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSpend {
    /// `YYYY-MM`.
    pub month: String,
    /// Summed order totals.
    pub amount: Decimal,
}

/// Order history with one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPerformance {
    /// Vendor name.
    pub vendor: String,
    /// Orders placed.
    pub orders: usize,
    /// Summed order totals.
    pub total_value: Decimal,
    /// Orders delivered so far.
    pub delivered: usize,
    /// Mean days from order to delivery, one decimal; `None` before any
    /// delivery.
    pub average_delivery_days: Option<Decimal>,
    /// Percent of deliveries on or before the contract date, one decimal.
    pub on_time_rate: Option<Decimal>,
}

/// Spend per item description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSpend {
    /// Item description, `Unknown` when unset.
    pub description: String,
    /// Summed quantities.
    pub quantity: i64,
    /// Summed order totals.
    pub total_spend: Decimal,
}

/// Everything the analytics page shows for one window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendOverview {
    /// Look-back in days.
    pub window_days: u32,
    /// Highest spend first.
    pub spend_by_category: Vec<CategorySpend>,
    /// Oldest month first, at most [`MONTHS_SHOWN`].
    pub spend_by_month: Vec<MonthSpend>,
    /// Highest order value first.
    pub vendor_performance: Vec<VendorPerformance>,
    /// Accepted negotiations behind the ordered requests.
    pub savings: SavingsSummary,
    /// Highest spend first, at most [`TOP_ITEMS`].
    pub top_items: Vec<ItemSpend>,
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Requests in scope.
    pub total_requests: usize,
    /// Requests waiting on approvers.
    pub pending_approvals: usize,
    /// Requests with an order not yet delivered.
    pub active_orders: usize,
    /// Order totals of delivered and later requests.
    pub total_spend: Decimal,
    /// Order totals of requests created this calendar month.
    pub monthly_spend: Decimal,
    /// Savings over accepted negotiations.
    pub savings_amount: Decimal,
}

/// Stateless spend aggregation.
pub struct SpendAnalytics;

impl SpendAnalytics {
    /// Assembles the overview from ordered requests and their savings.
    #[must_use]
    pub fn overview(
        window: SpendWindow,
        ordered: &[OrderedRequest],
        savings: SavingsSummary,
    ) -> SpendOverview {
        SpendOverview {
            window_days: window.days(),
            spend_by_category: Self::by_category(ordered),
            spend_by_month: Self::by_month(ordered),
            vendor_performance: Self::vendor_performance(ordered),
            savings,
            top_items: Self::top_items(ordered),
        }
    }

    /// Spend per category, highest first.
    #[must_use]
    pub fn by_category(ordered: &[OrderedRequest]) -> Vec<CategorySpend> {
        let mut totals: BTreeMap<&str, (Decimal, usize)> = BTreeMap::new();
        for row in ordered {
            let entry = totals
                .entry(row.category.as_deref().unwrap_or("other"))
                .or_default();
            entry.0 += row.total;
            entry.1 += 1;
        }
        let mut spend: Vec<_> = totals
            .into_iter()
            .map(|(category, (amount, count))| CategorySpend {
                category: category.to_string(),
                amount,
                count,
            })
            .collect();
        spend.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));
        spend
    }

    /// Spend per month of request creation, the latest [`MONTHS_SHOWN`]
    /// months oldest first.
    #[must_use]
    pub fn by_month(ordered: &[OrderedRequest]) -> Vec<MonthSpend> {
        let mut totals: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
        for row in ordered {
            *totals
                .entry((row.created_at.year(), row.created_at.month()))
                .or_default() += row.total;
        }
        let skip = totals.len().saturating_sub(MONTHS_SHOWN);
        totals
            .into_iter()
            .skip(skip)
            .map(|((year, month), amount)| MonthSpend {
                month: format!("{year:04}-{month:02}"),
                amount,
            })
            .collect()
    }

    /// Per-vendor order counts, value and delivery record, highest value
    /// first.
    #[must_use]
    pub fn vendor_performance(ordered: &[OrderedRequest]) -> Vec<VendorPerformance> {
        #[derive(Default)]
        struct Tally {
            orders: usize,
            total_value: Decimal,
            delivered: usize,
            delivery_seconds: i64,
            on_time: usize,
        }

        let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
        for row in ordered {
            let tally = tallies.entry(row.vendor.as_str()).or_default();
            tally.orders += 1;
            tally.total_value += row.total;
            if let Some(delivered_at) = row.delivered_at {
                tally.delivered += 1;
                tally.delivery_seconds += (delivered_at - row.ordered_at).num_seconds().max(0);
                if row.due_by.is_none_or(|due| delivered_at <= due) {
                    tally.on_time += 1;
                }
            }
        }

        let mut performance: Vec<_> = tallies
            .into_iter()
            .map(|(vendor, t)| {
                let delivered = Decimal::from(t.delivered);
                let (average_delivery_days, on_time_rate) = if t.delivered == 0 {
                    (None, None)
                } else {
                    let days = Decimal::from(t.delivery_seconds)
                        / Decimal::from(SECONDS_PER_DAY)
                        / delivered;
                    let rate = Decimal::from(t.on_time) * Decimal::ONE_HUNDRED / delivered;
                    (Some(one_place(days)), Some(one_place(rate)))
                };
                VendorPerformance {
                    vendor: vendor.to_string(),
                    orders: t.orders,
                    total_value: t.total_value,
                    delivered: t.delivered,
                    average_delivery_days,
                    on_time_rate,
                }
            })
            .collect();
        performance.sort_by(|a, b| {
            b.total_value
                .cmp(&a.total_value)
                .then_with(|| a.vendor.cmp(&b.vendor))
        });
        performance
    }

    /// The [`TOP_ITEMS`] descriptions with the highest spend.
    #[must_use]
    pub fn top_items(ordered: &[OrderedRequest]) -> Vec<ItemSpend> {
        let mut totals: BTreeMap<&str, (i64, Decimal)> = BTreeMap::new();
        for row in ordered {
            let entry = totals
                .entry(row.description.as_deref().unwrap_or("Unknown"))
                .or_default();
            entry.0 += i64::from(row.quantity.unwrap_or(0));
            entry.1 += row.total;
        }
        let mut items: Vec<_> = totals
            .into_iter()
            .map(|(description, (quantity, total_spend))| ItemSpend {
                description: description.to_string(),
                quantity,
                total_spend,
            })
            .collect();
        items.sort_by(|a, b| {
            b.total_spend
                .cmp(&a.total_spend)
                .then_with(|| a.description.cmp(&b.description))
        });
        items.truncate(TOP_ITEMS);
        items
    }

    /// Dashboard counters over every request in scope.
    #[must_use]
    pub fn dashboard(
        requests: &[RequestTally],
        savings_amount: Decimal,
        now: DateTime<Utc>,
    ) -> DashboardStats {
        let mut stats = DashboardStats {
            total_requests: requests.len(),
            pending_approvals: 0,
            active_orders: 0,
            total_spend: Decimal::ZERO,
            monthly_spend: Decimal::ZERO,
            savings_amount,
        };
        for request in requests {
            if request.status == RequestStatus::PendingApproval {
                stats.pending_approvals += 1;
            }
            if is_active_order(request.status) {
                stats.active_orders += 1;
            }
            let Some(total) = request.order_total else {
                continue;
            };
            if is_spent(request.status) {
                stats.total_spend += total;
            }
            if request.created_at.year() == now.year() && request.created_at.month() == now.month()
            {
                stats.monthly_spend += total;
            }
        }
        stats
    }
}

/// Ordered but not yet delivered.
fn is_active_order(status: RequestStatus) -> bool {
    matches!(
        status,
        RequestStatus::PoGenerated
            | RequestStatus::Ordered
            | RequestStatus::Shipped
            | RequestStatus::PartiallyDelivered
    )
}

/// Delivered or later; the order total counts as spent.
fn is_spent(status: RequestStatus) -> bool {
    matches!(
        status,
        RequestStatus::Delivered
            | RequestStatus::Invoiced
            | RequestStatus::Paid
            | RequestStatus::Closed
            | RequestStatus::Completed
    )
}

fn one_place(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Role;
    use chrono::TimeZone;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn ordered(
        category: &str,
        vendor: &str,
        total: Decimal,
        created: DateTime<Utc>,
    ) -> OrderedRequest {
        OrderedRequest {
            category: Some(category.to_string()),
            description: Some(format!("{category} order")),
            quantity: Some(10),
            created_at: created,
            vendor: vendor.to_string(),
            total,
            ordered_at: created,
            delivered_at: None,
            due_by: None,
        }
    }

    #[rstest]
    #[case(Role::Requester, false)]
    #[case(Role::Manager, false)]
    #[case(Role::Finance, true)]
    #[case(Role::Admin, true)]
    fn test_scope_follows_role(#[case] role: Role, #[case] sees_everyone: bool) {
        let actor = Actor::new(Uuid::new_v4(), role);
        let scope = SpendScope::for_actor(&actor);
        assert_eq!(scope == SpendScope::Everyone, sees_everyone);
        assert_eq!(scope.owner().is_none(), sees_everyone);
    }

    #[test]
    fn test_window_is_clamped() {
        assert_eq!(SpendWindow::from_query(None).days(), DEFAULT_WINDOW_DAYS);
        assert_eq!(SpendWindow::from_query(Some(0)).days(), 1);
        assert_eq!(SpendWindow::from_query(Some(100_000)).days(), MAX_WINDOW_DAYS);
        let now = at(2026, 10, 19);
        assert_eq!(SpendWindow::from_query(Some(30)).since(now), at(2026, 9, 19));
    }

    #[test]
    fn test_category_and_item_totals() {
        let mut rows = vec![
            ordered("furniture", "Ergo", dec!(12000), at(2026, 9, 2)),
            ordered("furniture", "Ergo", dec!(3000), at(2026, 10, 2)),
            ordered("it", "Dell", dec!(9000), at(2026, 10, 5)),
        ];
        rows.push(OrderedRequest {
            category: None,
            description: None,
            quantity: None,
            ..ordered("x", "Dell", dec!(500), at(2026, 10, 6))
        });

        let categories = SpendAnalytics::by_category(&rows);
        assert_eq!(categories.len(), 3);
        assert_eq!(categories[0].category, "furniture");
        assert_eq!(categories[0].amount, dec!(15000));
        assert_eq!(categories[0].count, 2);
        assert_eq!(categories[2].category, "other");

        let items = SpendAnalytics::top_items(&rows);
        assert_eq!(items[0].description, "furniture order");
        assert_eq!(items[0].quantity, 20);
        assert_eq!(items[0].total_spend, dec!(15000));
        assert_eq!(items.last().unwrap().description, "Unknown");
        assert_eq!(items.last().unwrap().quantity, 0);
    }

    #[test]
    fn test_months_are_chronological_and_capped() {
        let rows: Vec<_> = (1..=8)
            .map(|m| ordered("it", "Dell", Decimal::from(m * 100), at(2026, m, 1)))
            .collect();
        let months = SpendAnalytics::by_month(&rows);
        assert_eq!(months.len(), MONTHS_SHOWN);
        assert_eq!(months[0].month, "2026-03");
        assert_eq!(months[0].amount, dec!(300));
        assert_eq!(months[5].month, "2026-08");
    }

    #[test]
    fn test_vendor_delivery_record() {
        let ordered_at = at(2026, 10, 1);
        let on_time = OrderedRequest {
            delivered_at: Some(at(2026, 10, 8)),
            due_by: Some(at(2026, 10, 10)),
            ..ordered("furniture", "Ergo", dec!(4000), ordered_at)
        };
        let late = OrderedRequest {
            delivered_at: Some(at(2026, 10, 15)),
            due_by: Some(at(2026, 10, 10)),
            ..ordered("furniture", "Ergo", dec!(6000), ordered_at)
        };
        let pending = ordered("furniture", "Ergo", dec!(1000), ordered_at);
        let other = ordered("it", "Dell", dec!(20000), ordered_at);

        let performance = SpendAnalytics::vendor_performance(&[on_time, late, pending, other]);
        assert_eq!(performance[0].vendor, "Dell");
        assert_eq!(performance[0].average_delivery_days, None);
        assert_eq!(performance[0].on_time_rate, None);

        let ergo = &performance[1];
        assert_eq!(ergo.orders, 3);
        assert_eq!(ergo.total_value, dec!(11000));
        assert_eq!(ergo.delivered, 2);
        assert_eq!(ergo.average_delivery_days, Some(dec!(10.5)));
        assert_eq!(ergo.on_time_rate, Some(dec!(50.0)));
    }

    #[test]
    fn test_dashboard_counters() {
        let now = at(2026, 10, 19);
        let tally = |status, created_at, order_total| RequestTally {
            status,
            created_at,
            order_total,
        };
        let requests = [
            tally(RequestStatus::Draft, now, None),
            tally(RequestStatus::PendingApproval, at(2026, 9, 1), None),
            tally(RequestStatus::Shipped, now, Some(dec!(2500))),
            tally(RequestStatus::Paid, at(2026, 8, 1), Some(dec!(9000))),
            tally(RequestStatus::Delivered, at(2026, 10, 2), Some(dec!(1000))),
        ];
        let stats = SpendAnalytics::dashboard(&requests, dec!(750), now);
        assert_eq!(stats.total_requests, 5);
        assert_eq!(stats.pending_approvals, 1);
        assert_eq!(stats.active_orders, 1);
        assert_eq!(stats.total_spend, dec!(10000));
        assert_eq!(stats.monthly_spend, dec!(3500));
        assert_eq!(stats.savings_amount, dec!(750));
    }
}

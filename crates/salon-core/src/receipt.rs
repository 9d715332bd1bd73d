//! # Receipts
//!
//! Two stages, each testable on its own:
//!
//! ```text
//! CompletedSaleSummary ──► Receipt::from_summary() ──► Receipt (structured)
//!                                                          │
//!                                                          ▼
//!                                         ReceiptRenderer::render() ──► String
//! ```
//!
//! Delivering the text to a printer or a preview window is the caller's
//! job. Neither stage computes a discount: every amount is copied from the
//! summary that produced the stored rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::settlement::CompletedSaleSummary;
use crate::types::PaymentMode;

/// Default receipt width for 80mm thermal paper.
pub const DEFAULT_RECEIPT_WIDTH: usize = 42;

/// Narrowest width the item table still fits in.
pub const MIN_RECEIPT_WIDTH: usize = 32;

// =============================================================================
// Structured Receipt
// =============================================================================

/// Header details printed at the top of every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreInfo {
    pub name: String,
    pub address_lines: Vec<String>,
    pub phone: Option<String>,
}

/// One service row on the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptItem {
    pub service_name: String,
    pub staff_name: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,

    /// Line-level discount, shown only when non-zero.
    pub discount: Option<Money>,

    /// Line total after the line discount.
    pub line_total: Money,
}

/// A labelled amount in the totals block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptTotal {
    pub label: String,
    pub amount: Money,
}

/// The printable content of one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Receipt {
    pub store: StoreInfo,
    pub customer_name: String,
    pub payment_mode: PaymentMode,
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub items: Vec<ReceiptItem>,

    /// Subtotal, then any non-zero discounts, then the grand total.
    pub totals: Vec<ReceiptTotal>,
}

impl Receipt {
    pub const SUBTOTAL: &'static str = "Subtotal";
    pub const ITEM_DISCOUNTS: &'static str = "Item discounts";
    pub const OVERALL_DISCOUNT: &'static str = "Overall discount";
    pub const GRAND_TOTAL: &'static str = "Grand total";

    /// Builds the receipt document from a completed sale.
    pub fn from_summary(summary: &CompletedSaleSummary, store: &StoreInfo) -> Self {
        let items = summary
            .lines
            .iter()
            .map(|line| ReceiptItem {
                service_name: line.service_name.clone(),
                staff_name: line.staff_name.clone(),
                unit_price: line.unit_price,
                quantity: line.quantity,
                discount: line.line_discount.is_positive().then_some(line.line_discount),
                line_total: line.line_total,
            })
            .collect();

        let mut totals = vec![ReceiptTotal {
            label: Self::SUBTOTAL.to_string(),
            amount: summary.subtotal,
        }];
        if summary.line_discount_total.is_positive() {
            totals.push(ReceiptTotal {
                label: Self::ITEM_DISCOUNTS.to_string(),
                amount: summary.line_discount_total,
            });
        }
        if summary.overall_discount.is_positive() {
            totals.push(ReceiptTotal {
                label: Self::OVERALL_DISCOUNT.to_string(),
                amount: summary.overall_discount,
            });
        }
        totals.push(ReceiptTotal {
            label: Self::GRAND_TOTAL.to_string(),
            amount: summary.grand_total,
        });

        Receipt {
            store: store.clone(),
            customer_name: summary.customer_name.clone(),
            payment_mode: summary.payment_mode,
            date: summary.date,
            items,
            totals,
        }
    }

    /// The grand total line.
    pub fn grand_total(&self) -> Money {
        self.totals
            .iter()
            .find(|t| t.label == Self::GRAND_TOTAL)
            .map(|t| t.amount)
            .unwrap_or_default()
    }
}

// =============================================================================
// Text Renderer
// =============================================================================

/// Renders a [`Receipt`] as fixed-width plain text.
///
/// Rendering is a pure function of the receipt: the same receipt always
/// gives the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptRenderer {
    width: usize,
    currency_symbol: String,
}

impl Default for ReceiptRenderer {
    fn default() -> Self {
        ReceiptRenderer::new(DEFAULT_RECEIPT_WIDTH, "₹")
    }
}

impl ReceiptRenderer {
    /// Widths below [`MIN_RECEIPT_WIDTH`] are raised to it.
    pub fn new(width: usize, currency_symbol: impl Into<String>) -> Self {
        ReceiptRenderer {
            width: width.max(MIN_RECEIPT_WIDTH),
            currency_symbol: currency_symbol.into(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn render(&self, receipt: &Receipt) -> String {
        let mut out = Vec::new();

        out.push(self.center(&receipt.store.name));
        for line in &receipt.store.address_lines {
            out.push(self.center(line));
        }
        if let Some(phone) = &receipt.store.phone {
            out.push(self.center(&format!("Tel: {phone}")));
        }
        out.push(self.separator('='));

        out.push(self.line_lr(
            &format!("Customer: {}", receipt.customer_name),
            &receipt.date.format("%Y-%m-%d").to_string(),
        ));
        out.push(self.line_lr(
            &format!("Payment: {}", receipt.payment_mode.label()),
            &receipt.date.format("%H:%M").to_string(),
        ));
        out.push(self.separator('-'));

        for item in &receipt.items {
            out.push(self.truncate(&item.service_name));
            out.push(self.line_lr(
                &format!("  {} x {}", item.quantity, self.money(item.unit_price)),
                &self.money(item.line_total),
            ));
            if let Some(discount) = item.discount {
                out.push(self.line_lr("  Discount", &format!("-{}", self.money(discount))));
            }
            if let Some(staff) = &item.staff_name {
                out.push(self.truncate(&format!("  by {staff}")));
            }
        }
        out.push(self.separator('-'));

        for total in &receipt.totals {
            let amount = if total.label == Receipt::GRAND_TOTAL || total.label == Receipt::SUBTOTAL {
                self.money(total.amount)
            } else {
                format!("-{}", self.money(total.amount))
            };
            out.push(self.line_lr(&total.label, &amount));
        }
        out.push(self.separator('='));
        out.push(self.center("Thank you for visiting!"));

        let mut text = out.join("\n");
        text.push('\n');
        text
    }

    fn money(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }

    fn separator(&self, c: char) -> String {
        std::iter::repeat(c).take(self.width).collect()
    }

    fn truncate(&self, text: &str) -> String {
        text.chars().take(self.width).collect()
    }

    fn center(&self, text: &str) -> String {
        let text = self.truncate(text);
        let len = text.chars().count();
        let pad = (self.width - len) / 2;
        format!("{}{}", " ".repeat(pad), text)
    }

    /// Left text and right text on one line, right text flush right.
    fn line_lr(&self, left: &str, right: &str) -> String {
        let right_len = right.chars().count();
        let room = self.width.saturating_sub(right_len + 1);
        let left: String = left.chars().take(room).collect();
        let gap = self.width.saturating_sub(left.chars().count() + right_len).max(1);
        format!("{}{}{}", left, " ".repeat(gap), right)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::SoldLine;
    use chrono::TimeZone;

    fn summary(overall: i64) -> CompletedSaleSummary {
        CompletedSaleSummary {
            customer_id: "c1".into(),
            customer_name: "Meera".into(),
            lines: vec![
                SoldLine {
                    service_id: "a".into(),
                    service_name: "Haircut".into(),
                    staff_id: "s1".into(),
                    staff_name: Some("Asha".into()),
                    unit_price: Money::from_cents(10_000),
                    quantity: 2,
                    discounted_unit_price: Money::from_cents(10_000),
                    line_discount: Money::zero(),
                    line_total: Money::from_cents(20_000),
                    overall_share: Money::from_cents(1_633),
                },
                SoldLine {
                    service_id: "b".into(),
                    service_name: "Head Massage".into(),
                    staff_id: "s1".into(),
                    staff_name: None,
                    unit_price: Money::from_cents(5_000),
                    quantity: 1,
                    discounted_unit_price: Money::from_cents(4_500),
                    line_discount: Money::from_cents(500),
                    line_total: Money::from_cents(4_500),
                    overall_share: Money::from_cents(367),
                },
            ],
            subtotal: Money::from_cents(25_000),
            line_discount_total: Money::from_cents(500),
            overall_discount: Money::from_cents(overall),
            grand_total: Money::from_cents(24_500 - overall),
            payment_mode: PaymentMode::Upi,
            date: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap(),
            row_ids: vec![],
        }
    }

    fn store() -> StoreInfo {
        StoreInfo {
            name: "Glow Salon".into(),
            address_lines: vec!["12 MG Road".into()],
            phone: Some("080-1234".into()),
        }
    }

    #[test]
    fn test_totals_copied_from_summary() {
        let receipt = Receipt::from_summary(&summary(2_000), &store());
        let labels: Vec<&str> = receipt.totals.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Subtotal", "Item discounts", "Overall discount", "Grand total"]
        );
        assert_eq!(receipt.grand_total().cents(), 22_500);
        assert_eq!(receipt.items[0].discount, None);
        assert_eq!(receipt.items[1].discount, Some(Money::from_cents(500)));
    }

    #[test]
    fn test_zero_discounts_are_hidden() {
        let receipt = Receipt::from_summary(&summary(0), &store());
        assert!(receipt.totals.iter().all(|t| t.label != Receipt::OVERALL_DISCOUNT));
    }

    #[test]
    fn test_formatting_same_summary_twice_is_identical() {
        let sale = summary(2_000);
        let before = sale.clone();
        let renderer = ReceiptRenderer::default();

        let first = Receipt::from_summary(&sale, &store());
        let second = Receipt::from_summary(&sale, &store());
        assert_eq!(first, second);
        assert_eq!(renderer.render(&first), renderer.render(&second));
        assert_eq!(sale, before);
    }

    #[test]
    fn test_render_contents() {
        let receipt = Receipt::from_summary(&summary(2_000), &store());
        let text = ReceiptRenderer::new(40, "Rs.").render(&receipt);

        assert!(text.contains("Glow Salon"));
        assert!(text.contains("Customer: Meera"));
        assert!(text.contains("Payment: UPI"));
        assert!(text.contains("2024-03-09"));
        assert!(text.contains("-Rs.20.00"));
        assert!(text.contains("Rs.225.00"));
        assert!(text.contains("by Asha"));
        for line in text.lines() {
            assert!(line.chars().count() <= 40, "line too wide: {line:?}");
        }
    }

    #[test]
    fn test_width_has_a_floor() {
        assert_eq!(ReceiptRenderer::new(10, "$").width(), MIN_RECEIPT_WIDTH);
    }
}

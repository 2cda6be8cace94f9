//! Wager-ticket settlement.
//!
//! One fold over the ticket list; per-ticket arithmetic stays in exact
//! decimal. A winning ticket pays stake x 100/|f| on a favorite and
//! stake x u/100 on an underdog; a losing ticket costs its stake.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::WagerTicket;

/// Aggregate settlement over all resolved tickets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PnlSummary {
    pub bets: usize,
    pub wins: usize,
    pub losses: usize,
    /// Tickets with no outcome yet; excluded from every figure below
    pub unresolved: usize,
    pub total_staked: Decimal,
    pub profit: Decimal,
    pub win_rate: f64,
    /// Profit over total staked, in percent
    pub roi_pct: f64,
}

/// Net profit for one resolved ticket.
fn ticket_profit(ticket: &WagerTicket, won: bool) -> Decimal {
    if won {
        let odds = ticket.odds.0;
        if odds < 0 {
            ticket.stake * Decimal::from(100) / Decimal::from(odds.unsigned_abs())
        } else {
            ticket.stake * Decimal::from(odds) / Decimal::from(100)
        }
    } else {
        -ticket.stake
    }
}

/// Settle every resolved ticket in a single pass.
pub fn settle(tickets: &[WagerTicket]) -> PnlSummary {
    let summary = tickets.iter().fold(
        PnlSummary {
            bets: 0,
            wins: 0,
            losses: 0,
            unresolved: 0,
            total_staked: Decimal::ZERO,
            profit: Decimal::ZERO,
            win_rate: 0.0,
            roi_pct: 0.0,
        },
        |mut acc, ticket| {
            match ticket.won {
                Some(won) => {
                    acc.bets += 1;
                    if won {
                        acc.wins += 1;
                    } else {
                        acc.losses += 1;
                    }
                    acc.total_staked += ticket.stake;
                    acc.profit += ticket_profit(ticket, won);
                }
                None => acc.unresolved += 1,
            }
            acc
        },
    );

    let win_rate = if summary.bets > 0 {
        summary.wins as f64 / summary.bets as f64
    } else {
        0.0
    };
    let roi_pct = if summary.total_staked > Decimal::ZERO {
        let ratio = summary.profit / summary.total_staked;
        ratio.to_f64().map(|r| r * 100.0).unwrap_or(0.0)
    } else {
        0.0
    };

    PnlSummary {
        win_rate,
        roi_pct,
        ..summary
    }
}

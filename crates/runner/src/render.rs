//! Plain-text rendering of query results for the terminal

use dinex_core::{Order, Price, Trade};
use dinex_exchange::CommandReply;
use dinex_exchange::views::{AccountBalance, BookView, MarketStats, MarketSummary, Portfolio};
use std::fmt::Write;

fn money(value: Option<Price>) -> String {
    match value {
        Some(price) => format!("${:.2}", price),
        None => "-".to_string(),
    }
}

pub fn reply(reply: &CommandReply) -> String {
    let mut out = if reply.success {
        reply.message.clone()
    } else {
        format!("Error: {}", reply.message)
    };
    for trade in &reply.trades {
        let _ = write!(out, "\n  {}", trade);
    }
    out
}

pub fn price(price: Price, active: bool) -> String {
    if active {
        format!("IPO price: ${:.2}", price)
    } else {
        format!("IPO price: ${:.2} (not started)", price)
    }
}

pub fn market(summary: &MarketSummary) -> String {
    let mut out = price(summary.offering_price, summary.offering_active);
    let _ = write!(
        out,
        "\n{:<44} {:<8} {:>6} {:>10} {:>10} {:>8}",
        "Meal", "Category", "Supply", "Ask", "Bid", "Spread"
    );
    for meal in &summary.instruments {
        let _ = write!(
            out,
            "\n{:<44} {:<8} {:>6} {:>10} {:>10} {:>8}",
            meal.instrument_id.as_str(),
            meal.category.to_string(),
            meal.house_supply,
            money(meal.best_ask),
            money(meal.best_bid),
            money(meal.spread),
        );
    }
    out
}

pub fn book(view: &BookView) -> String {
    let mut out = format!("{}\n  ASKS", view.instrument_id);
    if view.asks.is_empty() {
        out.push_str("\n    (none)");
    }
    for entry in &view.asks {
        let _ = write!(
            out,
            "\n    #{:<6} {:>10} x {:<5} {}",
            entry.order_id,
            money(Some(entry.price)),
            entry.remaining,
            entry.owner
        );
    }
    out.push_str("\n  BIDS");
    if view.bids.is_empty() {
        out.push_str("\n    (none)");
    }
    for entry in &view.bids {
        let _ = write!(
            out,
            "\n    #{:<6} {:>10} x {:<5} {}",
            entry.order_id,
            money(Some(entry.price)),
            entry.remaining,
            entry.owner
        );
    }
    out
}

pub fn trades(trades: &[Trade]) -> String {
    if trades.is_empty() {
        return "No trades yet".to_string();
    }
    trades
        .iter()
        .map(|trade| format!("{} {}", trade.timestamp.format("%H:%M:%S"), trade))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn portfolio(portfolio: &Portfolio) -> String {
    let mut out = format!("{}: ${:.2}", portfolio.username, portfolio.balance);
    if portfolio.holdings.is_empty() {
        out.push_str("\n  no positions");
    }
    for holding in &portfolio.holdings {
        let _ = write!(out, "\n  {:>6} {}", holding.shares, holding.instrument_id);
    }
    out
}

pub fn orders(orders: &[Order]) -> String {
    if orders.is_empty() {
        return "No open orders".to_string();
    }
    orders
        .iter()
        .map(|order| {
            format!(
                "#{} {} {} of {} @ ${:.2}",
                order.id, order.side, order.remaining, order.instrument_id, order.price
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn stats(stats: &MarketStats) -> String {
    let mut out = format!(
        "Accounts: {}\nMeals: {}\nOpen positions: {}\nActive orders: {}\nTrades: {}",
        stats.accounts, stats.instruments, stats.open_positions, stats.active_orders, stats.total_trades
    );
    if !stats.top_buyers.is_empty() {
        out.push_str("\nTop buyers:");
        for buyer in &stats.top_buyers {
            let _ = write!(out, "\n  {:<10} {}", buyer.username, buyer.trades);
        }
    }
    out
}

pub fn balances(balances: &[AccountBalance]) -> String {
    balances
        .iter()
        .map(|entry| format!("{:<10} ${:>10.2}", entry.username, entry.balance))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rejection_is_prefixed() {
        let out = reply(&CommandReply::rejected("No matching orders"));
        assert_eq!(out, "Error: No matching orders");
    }

    #[test]
    fn test_price_marks_idle_offering() {
        assert_eq!(price(dec!(200), false), "IPO price: $200.00 (not started)");
        assert_eq!(price(dec!(190.5), true), "IPO price: $190.50");
    }

    #[test]
    fn test_empty_listings() {
        assert_eq!(trades(&[]), "No trades yet");
        assert_eq!(orders(&[]), "No open orders");
        assert_eq!(money(None), "-");
    }
}

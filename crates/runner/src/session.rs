//! One terminal user's conversation with the engine

use dinex_exchange::{CommandReply, MarketError, MatchingEngine, Participant};
use dinex_ports::MarketRepository;
use log::debug;
use std::sync::Arc;

use crate::render;
use crate::shell::{self, Command, HELP};

/// What the loop should do after a line has been handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Print(String),
    Quit,
}

pub struct Session<R: MarketRepository + ?Sized> {
    engine: Arc<MatchingEngine<R>>,
    participant: Option<Participant>,
}

impl<R: MarketRepository + ?Sized> Session<R> {
    pub fn new(engine: Arc<MatchingEngine<R>>) -> Self {
        Self {
            engine,
            participant: None,
        }
    }

    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref()
    }

    /// Parse and run one line. Only storage faults come back as errors;
    /// everything else is something to print.
    pub async fn handle_line(&mut self, line: &str) -> Result<Outcome, MarketError> {
        match shell::parse(line) {
            Ok(command) => self.execute(command).await,
            Err(shell::ShellError::Empty) => Ok(Outcome::Print(String::new())),
            Err(e) => Ok(Outcome::Print(format!("Error: {}", e))),
        }
    }

    pub async fn execute(&mut self, command: Command) -> Result<Outcome, MarketError> {
        if command.needs_login() && self.participant.is_none() {
            return Ok(Outcome::Print("Error: Not logged in".to_string()));
        }
        debug!("executing {:?}", command);

        let text = match command {
            Command::Login(name) => match self.engine.identify(&name).await {
                Ok(participant) => {
                    let text = format!("Logged in as {}", participant);
                    self.participant = Some(participant);
                    text
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => format!("Error: {}", e),
            },
            Command::Logout => match self.participant.take() {
                Some(participant) => format!("Goodbye {}", participant),
                None => "Not logged in".to_string(),
            },
            Command::Price => {
                let state = self.engine.market_state().await;
                render::price(self.engine.current_price().await, state.offering_active)
            }
            Command::Market => render::market(&self.engine.market_summary().await?),
            Command::Book(name) => match self.engine.order_book(&name).await {
                Ok(view) => render::book(&view),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => format!("Error: {}", e),
            },
            Command::History(limit) => render::trades(&self.engine.trade_history(limit).await?),
            Command::Balances => render::balances(&self.engine.balances().await?),
            Command::Stats => render::stats(&self.engine.market_stats().await?),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Outcome::Quit),
            command => self.trade(command).await?,
        };
        Ok(Outcome::Print(text))
    }

    /// Commands that act for the logged-in participant
    async fn trade(&self, command: Command) -> Result<String, MarketError> {
        let Some(me) = self.participant.as_ref() else {
            return Ok("Error: Not logged in".to_string());
        };
        let engine = &self.engine;

        let reply = match command {
            Command::Portfolio => return Ok(render::portfolio(&engine.portfolio(me).await?)),
            Command::Orders => return Ok(render::orders(&engine.open_orders(me).await?)),
            Command::Start => CommandReply::from_result(engine.start_offering(me).await)?,
            Command::Ipo {
                quantity,
                instrument,
            } => CommandReply::from_result(engine.buy_from_offering(me, &instrument, quantity).await)?,
            Command::Buy {
                price,
                quantity,
                instrument,
                snap,
            } => CommandReply::from_result(
                engine.place_buy(me, &instrument, price, quantity, snap).await,
            )?,
            Command::Sell {
                price,
                quantity,
                instrument,
                short,
            } => CommandReply::from_result(
                engine.place_sell(me, &instrument, price, quantity, short).await,
            )?,
            Command::Cancel(order_id) => CommandReply::from_result(engine.cancel(me, order_id).await)?,
            other => CommandReply::rejected(format!("Unsupported command {:?}", other)),
        };
        Ok(render::reply(&reply))
    }
}

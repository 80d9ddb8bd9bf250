//! Line commands and their dispatch onto a [`GameSession`].
//!
//! Each input line is split like a shell command line and parsed by clap in
//! multicall mode, so the first word names the subcommand and `help` is
//! generated from the doc comments below.

use anyhow::anyhow;
use clap::{Parser, Subcommand};

use terroir_client::{ClientResult, GameSession};
use terroir_core::format::format_money;
use terroir_core::requests::{DestemCrushMethod, MacerationAction, SortChoice};
use terroir_core::store::View;
use terroir_core::types::EntityId;

const AFTER_HELP: &str = "\
Wrap names containing spaces in quotes, e.g.
  buy-vineyard \"Northern Rhône\" Syrah \"Clos Alice\"
Ids are listed as #N. Type them without the #.";

#[derive(Debug, Parser)]
#[command(
    multicall = true,
    subcommand_required = true,
    subcommand_value_name = "COMMAND",
    subcommand_help_heading = "Commands",
    help_template = "{all-args}\n{after-help}",
    after_help = AFTER_HELP
)]
struct Repl {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Log in and load your game
    Login { username: String, password: String },
    /// Forget the saved login
    Logout,
    /// Show your estate
    #[command(visible_alias = "s")]
    Status,
    /// Reload the game state
    Refresh,
    /// Advance to the next month
    #[command(visible_alias = "next")]
    Advance,
    /// List regions and their varietals
    Regions,
    /// List vessel types for sale
    Vessels,
    /// Buy a vineyard in a region
    BuyVineyard {
        region: String,
        varietal: String,
        /// Name for the new vineyard
        name: String,
    },
    /// Tend a vineyard
    Tend {
        #[arg(required = true)]
        vineyard: Vec<String>,
    },
    /// Harvest a vineyard that is ready
    Harvest {
        #[arg(required = true)]
        vineyard: Vec<String>,
    },
    /// Buy a vessel for the winery
    BuyVessel {
        #[arg(required = true)]
        vessel_type: Vec<String>,
    },
    /// Turn grapes into must
    Process {
        #[arg(value_parser = parse_id)]
        grape_id: EntityId,
        /// yes or no
        #[arg(value_parser = parse_sort)]
        sort: SortChoice,
        /// whole, partial or destemmed
        #[arg(value_parser = parse_destem)]
        method: DestemCrushMethod,
    },
    /// Start fermenting a must in a vessel
    Ferment {
        #[arg(value_parser = parse_id)]
        must_id: EntityId,
        /// Vessel number as listed, starting at 1
        #[arg(value_parser = parse_vessel_no)]
        vessel: usize,
    },
    /// Work the cap of a fermenting batch
    Macerate {
        #[arg(value_parser = parse_id)]
        batch_id: EntityId,
        /// punch-down or pump-over
        #[arg(value_parser = parse_maceration)]
        action: MacerationAction,
    },
    /// Move a fermented batch into a vessel to age
    Age {
        #[arg(value_parser = parse_id)]
        batch_id: EntityId,
        /// Vessel number as listed, starting at 1
        #[arg(value_parser = parse_vessel_no)]
        vessel: usize,
        months: u32,
    },
    /// Bottle an aged batch
    Bottle {
        #[arg(value_parser = parse_id)]
        batch_id: EntityId,
        #[arg(required = true)]
        wine_name: Vec<String>,
    },
    /// Sell bottles from the cellar
    Sell {
        #[arg(value_parser = parse_id)]
        wine_id: EntityId,
        bottles: u32,
    },
    /// Leave the game
    #[command(aliases = ["exit", "q"])]
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines yield `None`.
    ///
    /// `help` and bad input come back as a [`clap::Error`] whose display
    /// text is ready to print.
    pub fn parse(line: &str) -> anyhow::Result<Option<Self>> {
        let args = shlex::split(line).ok_or_else(|| anyhow!("Unterminated quote"))?;
        if args.is_empty() {
            return Ok(None);
        }
        Ok(Some(Repl::try_parse_from(args)?.command))
    }
}

/// Fill the matching form and run the action.
pub async fn execute(session: &mut GameSession, command: Command) -> ClientResult<()> {
    match command {
        Command::Login { username, password } => session.login(&username, &password).await,
        Command::Logout => {
            session.logout();
            Ok(())
        }
        Command::Refresh => match session.store().view() {
            View::LoadFailed | View::Loading => session.reload().await,
            _ => session.refresh().await,
        },
        Command::Advance => session.advance_month().await,
        Command::BuyVineyard {
            region,
            varietal,
            name,
        } => {
            session.select_vineyard(&region, &varietal)?;
            if let Some(cost) = session.forms.buy_vineyard.estimated_cost(session.store()) {
                println!(
                    "Estimated cost: {} (final price set by the server)",
                    format_money(cost)
                );
            }
            session.forms.buy_vineyard.vineyard_name = name;
            session.buy_vineyard().await
        }
        Command::Tend { vineyard } => {
            session.forms.tend_vineyard.vineyard_name = Some(vineyard.join(" "));
            session.tend_vineyard().await
        }
        Command::Harvest { vineyard } => {
            session.forms.harvest_grapes.vineyard_name = Some(vineyard.join(" "));
            session.harvest_grapes().await
        }
        Command::BuyVessel { vessel_type } => {
            session.forms.buy_vessel.vessel_type = Some(vessel_type.join(" "));
            if let Some(cost) = session.forms.buy_vessel.cost(session.store()) {
                println!("Cost: {}", format_money(cost));
            }
            session.buy_vessel().await
        }
        Command::Process {
            grape_id,
            sort,
            method,
        } => {
            let form = &mut session.forms.process_grapes;
            form.grape_id = Some(grape_id);
            form.sort_choice = Some(sort);
            form.destem_crush_method = Some(method);
            session.process_grapes().await
        }
        Command::Ferment {
            must_id,
            vessel,
        } => {
            let form = &mut session.forms.start_fermentation;
            form.must_id = Some(must_id);
            form.vessel_index = Some(vessel);
            session.start_fermentation().await
        }
        Command::Macerate { batch_id, action } => {
            let form = &mut session.forms.maceration;
            form.batch_id = Some(batch_id);
            form.action = Some(action);
            session.perform_maceration_action().await
        }
        Command::Age {
            batch_id,
            vessel,
            months,
        } => {
            let form = &mut session.forms.start_aging;
            form.batch_id = Some(batch_id);
            form.vessel_index = Some(vessel);
            form.aging_months = Some(months);
            session.start_aging().await
        }
        Command::Bottle {
            batch_id,
            wine_name,
        } => {
            let form = &mut session.forms.bottle_wine;
            form.batch_id = Some(batch_id);
            form.wine_name = wine_name.join(" ");
            session.bottle_wine().await
        }
        Command::Sell { wine_id, bottles } => {
            let form = &mut session.forms.sell_wine;
            form.wine_id = Some(wine_id);
            form.bottles = bottles;
            session.sell_wine().await
        }
        // Local commands are handled by the caller.
        Command::Status | Command::Regions | Command::Vessels | Command::Quit => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

fn parse_id(raw: &str) -> Result<EntityId, String> {
    raw.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("'{raw}' is not an id"))
}

/// Vessels are numbered from 1 on screen.
fn parse_vessel_no(raw: &str) -> Result<usize, String> {
    let number: usize = raw
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("'{raw}' is not a vessel number"))?;
    number
        .checked_sub(1)
        .ok_or_else(|| "vessel numbers start at 1".to_string())
}

fn parse_sort(raw: &str) -> Result<SortChoice, String> {
    match raw.to_lowercase().as_str() {
        "yes" | "y" => Ok(SortChoice::Yes),
        "no" | "n" => Ok(SortChoice::No),
        _ => Err("sort choice must be yes or no".to_string()),
    }
}

fn parse_destem(raw: &str) -> Result<DestemCrushMethod, String> {
    match raw.to_lowercase().as_str() {
        "whole" => return Ok(DestemCrushMethod::WholeCluster),
        "partial" => return Ok(DestemCrushMethod::PartialDestem),
        "destemmed" | "crushed" => return Ok(DestemCrushMethod::DestemmedCrushed),
        _ => {}
    }
    DestemCrushMethod::ALL
        .into_iter()
        .find(|m| m.label().eq_ignore_ascii_case(raw))
        .ok_or_else(|| "method must be whole, partial or destemmed".to_string())
}

fn parse_maceration(raw: &str) -> Result<MacerationAction, String> {
    match raw.to_lowercase().replace('_', "-").as_str() {
        "punch-down" | "punch" => Ok(MacerationAction::PunchDown),
        "pump-over" | "pump" => Ok(MacerationAction::PumpOver),
        _ => Err("action must be punch-down or pump-over".to_string()),
    }
}

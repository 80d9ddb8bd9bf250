//! Plain-text rendering of the store for the terminal.

use std::fmt;

use terroir_core::format::{format_money, format_quantity};
use terroir_core::models::{GameState, Regions, VesselTypes, WineInProduction};
use terroir_core::store::{GameStore, Notice, NoticeKind, View};
use terroir_core::types::EntityId;

/// What to show for the current view.
pub fn render_view(store: &GameStore) -> String {
    match store.view() {
        View::Login => {
            let mut out = String::from("Log in with: login <username> <password>");
            if let Some(error) = store.login_error() {
                out = format!("{error}\n{out}");
            }
            out
        }
        View::Loading => "Loading...".to_string(),
        View::LoadFailed => format!(
            "{}\nType 'refresh' to try again or 'logout' to start over.",
            store.load_error().unwrap_or("Failed to load game data")
        ),
        View::Game => match store.state() {
            Some(state) => render_game(state),
            None => "No game loaded.".to_string(),
        },
    }
}

/// Full estate overview.
pub fn render_game(state: &GameState) -> String {
    Estate(state).to_string().trim_end().to_string()
}

struct Estate<'a>(&'a GameState);

impl fmt::Display for Estate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;
        let player = &state.player;

        writeln!(
            f,
            "== {} {} ==  {}  |  Money: {}  |  Reputation: {}",
            state.current_month(),
            state.current_year,
            player.name,
            format_money(player.money),
            player.reputation,
        )?;

        writeln!(f, "\nVineyards:")?;
        if player.vineyards.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for v in &player.vineyards {
            let ready = if v.can_harvest() {
                "  READY TO HARVEST"
            } else if v.harvested_this_year {
                "  harvested"
            } else {
                ""
            };
            writeln!(
                f,
                "  {}  {} / {}  {} acres, vines {}y, {} soil, health {}%{}",
                v.name,
                v.varietal,
                v.region,
                v.size_acres,
                v.age_of_vines,
                v.soil_type,
                v.health,
                ready
            )?;
        }

        writeln!(f, "\nGrapes ({} kg):", format_quantity(player.total_grapes_kg()))?;
        for g in &player.grapes_inventory {
            writeln!(
                f,
                "  {}{} {}  {} kg, quality {}",
                id_tag(g.id),
                g.vintage,
                g.varietal,
                format_quantity(g.quantity_kg),
                g.quality
            )?;
        }

        match &player.winery {
            Some(winery) => {
                writeln!(f, "\n{}:", winery.name)?;
                for (i, vessel) in winery.vessels.iter().enumerate() {
                    let status = if vessel.in_use { "in use" } else { "free" };
                    writeln!(
                        f,
                        "  vessel {}  {} ({} L)  {}",
                        i + 1,
                        vessel.vessel_type,
                        vessel.capacity,
                        status
                    )?;
                }
                if !winery.must_in_production.is_empty() {
                    writeln!(f, "  Must:")?;
                }
                for m in &winery.must_in_production {
                    writeln!(
                        f,
                        "    {}{} {}  {} kg, quality {}, {}",
                        id_tag(m.id),
                        m.vintage,
                        m.varietal,
                        format_quantity(m.quantity_kg),
                        m.quality,
                        m.destem_crush_method
                    )?;
                }
                if !winery.wines_fermenting.is_empty() {
                    writeln!(f, "  Fermenting:")?;
                }
                for w in &winery.wines_fermenting {
                    writeln!(
                        f,
                        "    {}  fermentation {}%, {} maceration actions",
                        batch_line(w),
                        w.fermentation_progress,
                        w.maceration_actions_taken
                    )?;
                }
                if !winery.wines_aging.is_empty() {
                    writeln!(f, "  Aging:")?;
                }
                for w in &winery.wines_aging {
                    let ready = if w.ready_to_bottle() { "  READY" } else { "" };
                    writeln!(
                        f,
                        "    {}  aged {}/{} months{}",
                        batch_line(w),
                        w.aging_progress,
                        w.aging_duration,
                        ready
                    )?;
                }
            }
            None => {
                writeln!(f, "\nNo winery yet.")?;
            }
        }

        writeln!(f, "\nCellar ({} bottles):", player.total_bottles())?;
        for w in player.wines_in_stock() {
            writeln!(
                f,
                "  {}{} {} {} ({}), quality {}, {} bottles",
                id_tag(w.id),
                w.name,
                w.vintage,
                w.varietal,
                w.style,
                w.quality,
                w.bottles
            )?;
        }

        Ok(())
    }
}

fn id_tag(id: Option<EntityId>) -> String {
    id.map(|id| format!("#{id} ")).unwrap_or_default()
}

fn batch_line(w: &WineInProduction) -> String {
    format!(
        "{}{} {}  {} L in {}, quality {}",
        id_tag(w.id),
        w.vintage,
        w.varietal,
        format_quantity(w.quantity_liters),
        w.vessel_type,
        w.quality
    )
}

pub fn render_regions(regions: &Regions) -> String {
    if regions.is_empty() {
        return "No regions loaded.".to_string();
    }
    regions
        .iter()
        .map(|(name, data)| {
            format!(
                "{name}  from {} (estimate)  grows {}",
                format_money(data.base_cost),
                data.grape_varietals.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_vessel_types(vessel_types: &VesselTypes) -> String {
    if vessel_types.is_empty() {
        return "No vessel types loaded.".to_string();
    }
    vessel_types
        .iter()
        .map(|(name, data)| {
            format!(
                "{name}  {} L, {}, {}",
                data.capacity,
                data.usage,
                format_money(data.cost)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Event notices are framed so they stand apart from acknowledgements.
pub fn render_notice(notice: &Notice) -> String {
    match notice.kind {
        NoticeKind::Success => format!("[ok] {}", notice.message),
        NoticeKind::Event => format!("*** {} ***", notice.message),
        NoticeKind::Error => format!("[error] {}", notice.message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terroir_core::models::ReferenceData;
    use terroir_core::store::Transition;

    fn state() -> GameState {
        serde_json::from_value(serde_json::json!({
            "player": {
                "name": "Alice",
                "money": 7500.0,
                "reputation": 12,
                "vineyards": [{"name": "Clos Alice", "varietal": "Pinot Noir", "region": "Burgundy"}],
                "winery": {
                    "vessels": [{"type": "Oak Barrel", "capacity": 225, "in_use": true}],
                    "wines_aging": [{
                        "id": 40, "varietal": "Pinot Noir", "vintage": 2023,
                        "quantity_liters": 200.0, "quality": 81, "vessel_type": "Oak Barrel",
                        "vessel_index": 0, "stage": "aging",
                        "aging_progress": 12, "aging_duration": 12
                    }]
                },
                "bottled_wines": [
                    {"id": 50, "name": "Estate", "vintage": 2022, "varietal": "Syrah",
                     "style": "Red", "quality": 80, "bottles": 24},
                    {"id": 51, "name": "Gone", "vintage": 2021, "varietal": "Syrah",
                     "style": "Red", "quality": 70, "bottles": 0}
                ]
            },
            "current_year": 2024,
            "current_month_index": 8,
            "months": []
        }))
        .unwrap()
    }

    #[test]
    fn game_header_shows_date_and_money() {
        let text = render_game(&state());
        let header = text.lines().next().unwrap();
        assert!(header.contains("September 2024"), "{header}");
        assert!(header.contains("Money: $7,500.00"), "{header}");
        assert!(text.contains("vessel 1  Oak Barrel (225 L)  in use"));
        assert!(text.contains("aged 12/12 months  READY"));
    }

    #[test]
    fn empty_wines_are_hidden() {
        let text = render_game(&state());
        assert!(text.contains("Cellar (24 bottles)"));
        assert!(text.contains("#50 Estate"));
        assert!(!text.contains("Gone"));
    }

    #[test]
    fn login_view_shows_error() {
        let mut store = GameStore::new();
        store.apply(Transition::SessionExpired).unwrap();
        let text = render_view(&store);
        assert!(text.starts_with("Unauthorized. Please log in."));
    }

    #[test]
    fn game_view_renders_state() {
        let mut store = GameStore::new();
        store
            .apply(Transition::InitialDataLoaded {
                state: state(),
                reference: ReferenceData::default(),
            })
            .unwrap();
        assert!(render_view(&store).contains("Clos Alice"));
    }

    #[test]
    fn notices_are_distinct() {
        let event = Notice {
            kind: NoticeKind::Event,
            message: "Frost hit the valley.".into(),
        };
        let ok = Notice {
            kind: NoticeKind::Success,
            message: "Advanced to the next month!".into(),
        };
        assert_eq!(render_notice(&event), "*** Frost hit the valley. ***");
        assert_eq!(render_notice(&ok), "[ok] Advanced to the next month!");
    }
}

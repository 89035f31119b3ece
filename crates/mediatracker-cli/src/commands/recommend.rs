use super::catalog::{load_list, truncate};
use super::session::Session;
use super::ui::Spinner;
use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_tracker_core::{CoreError, RecommendationState};
use media_tracker_models::{Item, ItemForm};
use serde_json::json;

pub async fn run_recommend(session: &Session, accept: Option<String>, output: &Output) -> Result<()> {
    if accept.is_none() && !session.config().ui.show_recommendations {
        output.info("Recommendations are turned off (ui.show_recommendations = false)");
        return Ok(());
    }

    let view = session.view();
    load_list(session, output).await?;

    let spinner = Spinner::start("Fetching recommendations...", output);
    let refreshed = view.refresh_recommendations().await;
    spinner.finish();
    match refreshed {
        Ok(_) => {}
        // Guided empty state; its notice already tells the user what to do
        Err(CoreError::InsufficientHistory { .. }) if accept.is_none() => {
            render_pool(session, &[], output);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    if let Some(title) = accept {
        let candidate = match view.find_recommendation(&title) {
            Some(candidate) => candidate,
            // Let the duplicate guard speak for titles already in the list
            None if view.store().contains_title(&title) => Item::from_form(&ItemForm::new(session.kind(), title)),
            None => {
                return Err(color_eyre::eyre::eyre!(
                    "\"{}\" is not among the current recommendations",
                    title
                ))
            }
        };
        let created = view.accept_recommendation(&candidate).await?;
        if !output.is_human() {
            output.json(&json!({ "type": "item", "item": created }));
            return Ok(());
        }
    }

    render_pool(session, &view.recommendations(), output);
    Ok(())
}

fn render_pool(session: &Session, pool: &[Item], output: &Output) {
    let state = session.view().recommendation_state();

    if !output.is_human() {
        output.json(&json!({
            "type": "recommendations",
            "kind": session.kind(),
            "state": state,
            "items": pool,
        }));
        return;
    }

    if pool.is_empty() {
        if state != RecommendationState::NeedsHistory {
            output.info("No recommendations available right now");
        }
        return;
    }

    let mut table = Table::new();
    table.set_header(
        ["Title", "Year", "Why", "Overview"]
            .into_iter()
            .map(|label| {
                Cell::new(label)
                    .fg(comfy_table::Color::Cyan)
                    .add_attribute(comfy_table::Attribute::Bold)
            })
            .collect::<Vec<_>>(),
    );
    for item in pool {
        table.add_row(vec![
            Cell::new(&item.title),
            Cell::new(item.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(truncate(item.recommendation.as_deref().unwrap_or_default(), 40)),
            Cell::new(truncate(item.overview.as_deref().unwrap_or_default(), 60)),
        ]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);

    output.println(format!("Recommended {}", session.kind().plural_label().to_lowercase()));
    output.println(table.to_string());
    output.println("Add one with: mediatracker recommend --accept \"<title>\"");
}

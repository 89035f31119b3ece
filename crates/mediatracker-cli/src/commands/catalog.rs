use super::prompts;
use super::session::Session;
use super::ui::{is_interactive, Spinner};
use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use media_tracker_models::{Item, ItemForm, ItemId, ItemPatch, MetadataMatch, StatusCategory, WatchStatus};
use serde_json::json;

/// What the user typed for a new item
pub struct Draft {
    pub title: String,
    pub year: Option<i32>,
    pub status: WatchStatus,
    pub rating: Option<f32>,
    pub note: Option<String>,
}

pub fn edit_patch(
    title: Option<String>,
    year: Option<i32>,
    status: Option<WatchStatus>,
    rating: Option<f32>,
    note: Option<String>,
) -> ItemPatch {
    ItemPatch {
        title,
        year,
        status,
        rating,
        recommendation: note,
        ..ItemPatch::default()
    }
}

pub(crate) async fn load_list(session: &Session, output: &Output) -> Result<Vec<Item>> {
    let spinner = Spinner::start(
        format!("Loading {}...", session.kind().plural_label().to_lowercase()),
        output,
    );
    let result = session.view().load().await;
    spinner.finish();
    Ok(result?)
}

pub async fn run_list(
    session: &Session,
    query: Option<String>,
    status: Option<StatusCategory>,
    output: &Output,
) -> Result<()> {
    let view = session.view();
    if let Some(query) = query {
        view.set_query(query);
    }
    if let Some(status) = status {
        view.set_category(status);
    }

    let all = load_list(session, output).await?;
    let shown = view.display();
    let kind = session.kind();

    if !output.is_human() {
        output.json(&json!({
            "type": "items",
            "kind": kind,
            "query": view.query(),
            "category": view.category().to_string(),
            "total": all.len(),
            "items": shown,
        }));
        return Ok(());
    }

    if shown.is_empty() {
        if all.is_empty() {
            output.info(format!(
                "No {} in your list yet. Add one with 'mediatracker add --title ...'",
                kind.plural_label().to_lowercase()
            ));
        } else {
            output.info(format!("No {} match the current filters", kind.plural_label().to_lowercase()));
        }
        return Ok(());
    }

    output.println(format!("{} ({} of {})", kind.plural_label(), shown.len(), all.len()));
    output.println(items_table(&shown).to_string());
    Ok(())
}

pub async fn run_add(session: &Session, draft: Draft, lookup: bool, output: &Output) -> Result<()> {
    let view = session.view();
    let mut form = ItemForm::new(session.kind(), draft.title)
        .with_status(draft.status)
        .with_rating(draft.rating)
        .with_recommendation(draft.note);

    if lookup {
        // Metadata fills the gaps; a year given on the command line still wins
        match view.autofill(&mut form).await {
            Ok(true) => tracing::debug!(title = %form.title, "Form filled from metadata"),
            Ok(false) => output.warn(format!("No metadata found for \"{}\", adding as typed", form.title)),
            Err(e) => tracing::warn!(error = %e, "Metadata lookup failed, adding as typed"),
        }
    }
    if draft.year.is_some() {
        form = form.with_year(draft.year);
    }

    let created = view.add(form).await?;
    if output.is_human() {
        if let Some(id) = created.id {
            output.println(format!("  {} {}", id, describe(&created)));
        }
    } else {
        output.json(&json!({ "type": "item", "item": created }));
    }
    Ok(())
}

pub async fn run_edit(session: &Session, id: ItemId, patch: ItemPatch, output: &Output) -> Result<()> {
    if patch.is_empty() {
        output.warn("Nothing to change. Pass at least one of --title, --year, --status, --rating, --note");
        return Ok(());
    }

    load_list(session, output).await?;
    let updated = session.view().update(id, patch).await?;
    if output.is_human() {
        output.println(format!("  {} {}", id, describe(&updated)));
    } else {
        output.json(&json!({ "type": "item", "item": updated }));
    }
    Ok(())
}

pub async fn run_delete(session: &Session, id: ItemId, yes: bool, output: &Output) -> Result<()> {
    load_list(session, output).await?;
    let view = session.view();
    let item = view.item(id)?;

    if !yes {
        if !is_interactive() {
            return Err(color_eyre::eyre::eyre!(
                "Refusing to delete \"{}\" without confirmation; pass --yes",
                item.title
            ));
        }
        let prompt = format!("Delete \"{}\" from your {}?", item.title, session.kind().plural_label().to_lowercase());
        if !prompts::prompt_yes_no(&prompt, Some(false))? {
            output.info("Nothing deleted");
            return Ok(());
        }
    }

    view.delete(id).await?;
    if !output.is_human() {
        output.json(&json!({ "type": "deleted", "id": id }));
    }
    Ok(())
}

pub async fn run_trailer(session: &Session, id: ItemId, output: &Output) -> Result<()> {
    load_list(session, output).await?;
    let view = session.view();
    let item = view.item(id)?;

    let spinner = Spinner::start(format!("Looking up trailer for \"{}\"...", item.title), output);
    let result = view.trailer(id).await;
    spinner.finish();
    let trailer = result?;

    if output.is_human() {
        output.success(format!("Trailer for \"{}\": {}", item.title, trailer.embed_url()));
    } else {
        output.json(&json!({
            "type": "trailer",
            "id": id,
            "title": item.title,
            "key": trailer.key,
            "site": trailer.site,
            "url": trailer.embed_url(),
        }));
    }
    Ok(())
}

pub async fn run_search(session: &Session, query: &str, output: &Output) -> Result<()> {
    let spinner = Spinner::start(format!("Searching for \"{}\"...", query), output);
    let result = session.view().search_metadata(query).await;
    spinner.finish();
    let found = result?;

    if output.is_human() {
        output.println(metadata_table(&found).to_string());
    } else {
        output.json(&json!({ "type": "metadata", "match": found }));
    }
    Ok(())
}

fn describe(item: &Item) -> String {
    match item.year {
        Some(year) => format!("{} ({}) [{}]", item.title, year, item.status),
        None => format!("{} [{}]", item.title, item.status),
    }
}

fn styled(table: &mut Table) {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
}

fn header(label: &str) -> Cell {
    Cell::new(label)
        .fg(comfy_table::Color::Cyan)
        .add_attribute(comfy_table::Attribute::Bold)
}

pub(crate) fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

fn rating_cell(rating: Option<f32>) -> String {
    rating.map(|r| format!("{:.1}/5", r)).unwrap_or_default()
}

fn items_table(items: &[Item]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header("ID"),
        header("Title"),
        header("Year"),
        header("Status"),
        header("Rating"),
        header("Note"),
    ]);
    for item in items {
        table.add_row(vec![
            Cell::new(item.id.map(|id| id.to_string()).unwrap_or_default()),
            Cell::new(&item.title),
            Cell::new(item.year.map(|y| y.to_string()).unwrap_or_default()),
            Cell::new(item.status),
            Cell::new(rating_cell(item.rating)),
            Cell::new(truncate(item.recommendation.as_deref().unwrap_or_default(), 40)),
        ]);
    }
    styled(&mut table);
    table
}

fn metadata_table(found: &MetadataMatch) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header("Field"), header("Value")]);
    table.add_row(vec![Cell::new("Title"), Cell::new(&found.title)]);
    table.add_row(vec![
        Cell::new("Year"),
        Cell::new(found.year.map(|y| y.to_string()).unwrap_or_default()),
    ]);
    table.add_row(vec![Cell::new("External ID"), Cell::new(found.id)]);
    if let Some(poster) = &found.poster_url {
        table.add_row(vec![Cell::new("Poster"), Cell::new(poster)]);
    }
    if let Some(overview) = &found.overview {
        table.add_row(vec![Cell::new("Overview"), Cell::new(truncate(overview, 200))]);
    }
    styled(&mut table);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_patch_maps_note_to_recommendation() {
        let patch = edit_patch(None, None, Some(WatchStatus::Watched), None, Some("rewatch".to_string()));
        assert_eq!(patch.status, Some(WatchStatus::Watched));
        assert_eq!(patch.recommendation.as_deref(), Some("rewatch"));
        assert!(patch.title.is_none());
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_empty_edit_patch() {
        assert!(edit_patch(None, None, None, None, None).is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long overview text", 7), "a long…");
    }
}

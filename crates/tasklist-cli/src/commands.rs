//! CLI command implementations

use anyhow::{Context as _, Result, bail};
use chrono::{Local, NaiveDate};
use colored::Colorize;
use std::path::PathBuf;
use tabled::{Table, Tabled, settings::Style};
use tasklist_core::item::parse_due_date;
use tasklist_core::{
    Config, HttpItemApi, Item, ItemDraft, ItemFilter, ItemUpdate, Priority, SyncClient,
};

/// Settings shared by every command
pub struct Context {
    config: Config,
    config_path: Option<PathBuf>,
    json: bool,
}

impl Context {
    pub fn load(path: Option<PathBuf>, api_url: Option<String>, json: bool) -> Result<Self> {
        let config_path = path.or_else(Config::default_path);
        let mut config = match &config_path {
            Some(p) => Config::load(p)
                .with_context(|| format!("Failed to load config from {}", p.display()))?,
            None => Config::default(),
        };
        config.apply_env();
        if let Some(url) = api_url {
            config.api_url = url;
        }
        if !config.display.colors {
            colored::control::set_override(false);
        }

        Ok(Self {
            config,
            config_path,
            json,
        })
    }

    /// Client with the store loaded from the service
    async fn connect(&self) -> Result<SyncClient<HttpItemApi>> {
        let client = SyncClient::new(HttpItemApi::from_config(&self.config)?);
        client
            .refresh()
            .await
            .with_context(|| format!("Failed to load items from {}", self.config.api_url))?;
        Ok(client)
    }

    fn print_item(&self, verb: &str, item: &Item) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(item)?);
        } else {
            println!("{} {} item: {}", "✓".green(), verb, item.id);
            println!("  {}", item);
        }
        Ok(())
    }
}

/// Field overrides for `update`; unset fields keep their current value
#[derive(Debug, Default)]
pub struct Changes {
    pub name: Option<String>,
    pub priority: Option<String>,
    pub category: Option<String>,
    pub due: Option<String>,
    pub completed: Option<bool>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.due.is_none()
            && self.completed.is_none()
    }

    /// Full update built from the current record plus these overrides
    fn into_update(self, item: &Item) -> Result<ItemUpdate> {
        let mut update = ItemUpdate::from(item);
        if let Some(name) = self.name {
            if name.is_empty() {
                bail!("Item name must not be empty");
            }
            update.name = name;
        }
        if let Some(priority) = self.priority {
            update.priority = priority.parse()?;
        }
        if let Some(category) = self.category {
            update.category = category;
        }
        if let Some(due) = self.due {
            update.due_date = parse_due_date(&due)?;
        }
        if let Some(completed) = self.completed {
            update.completed = completed;
        }
        Ok(update)
    }
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Done")]
    done: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Priority")]
    priority: Priority,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Due")]
    due: String,
}

fn due_label(item: &Item, today: NaiveDate, date_format: &str) -> String {
    let (Some(date), Some(days)) = (item.due_date, item.days_until_due(today)) else {
        return "No due date".to_string();
    };
    let date = date.format(date_format);
    match days {
        0 => format!("{} (today)", date),
        1 => format!("{} (in 1 day)", date),
        d if d > 1 => format!("{} (in {} days)", date, d),
        -1 => format!("{} (1 day overdue)", date),
        d => format!("{} ({} days overdue)", date, -d),
    }
}

pub async fn list(ctx: &Context, priority: i64, category: String) -> Result<()> {
    let client = ctx.connect().await?;
    let filter = ItemFilter::new(priority, category);
    let total = client.with_store(|store| store.len());
    let items = client.with_store(|store| store.visible(&filter));

    if ctx.json {
        println!("{}", serde_json::to_string(&items)?);
        return Ok(());
    }

    if total == 0 {
        println!("You have no todo items yet! Add one with `tasklist add`.");
        return Ok(());
    }
    if items.is_empty() {
        println!("No items match the current filter");
        return Ok(());
    }

    let today = Local::now().date_naive();
    let rows: Vec<ItemRow> = items
        .iter()
        .map(|item| ItemRow {
            id: item.id.clone(),
            done: if item.completed { "x" } else { "" },
            name: item.name.clone(),
            priority: item.priority,
            category: item.category.clone(),
            due: due_label(item, today, &ctx.config.display.date_format),
        })
        .collect();

    println!("{}", Table::new(rows).with(Style::rounded()));
    if filter.is_active() {
        let summary = format!("Showing {} of {} items", items.len(), total);
        println!("{}", summary.as_str().dimmed());
    }
    Ok(())
}

pub async fn add(
    ctx: &Context,
    name: String,
    priority: Option<String>,
    category: String,
    due: Option<String>,
) -> Result<()> {
    if name.is_empty() {
        bail!("Item name must not be empty");
    }
    let priority = match priority {
        Some(p) => p.parse()?,
        None => Priority::try_from(ctx.config.default_priority)?,
    };
    let due_date = match due {
        Some(d) => parse_due_date(&d)?,
        None => None,
    };

    let client = ctx.connect().await?;
    let draft = ItemDraft::new(name)
        .with_priority(priority)
        .with_category(category)
        .with_due_date(due_date);
    let item = client.create(draft).await?;
    ctx.print_item("Created", &item)
}

pub async fn toggle(ctx: &Context, id: &str) -> Result<()> {
    let client = ctx.connect().await?;
    let item = client.toggle(id).await?;
    let verb = if item.completed { "Completed" } else { "Reopened" };
    ctx.print_item(verb, &item)
}

pub async fn update(ctx: &Context, id: &str, changes: Changes) -> Result<()> {
    if changes.is_empty() {
        bail!("Nothing to update");
    }
    let client = ctx.connect().await?;
    let current = client
        .with_store(|store| store.get(id).cloned())
        .ok_or_else(|| anyhow::anyhow!("Item not found: {}", id))?;
    let fields = changes.into_update(&current)?;
    let item = client.update(id, fields).await?;
    ctx.print_item("Updated", &item)
}

pub async fn rm(ctx: &Context, id: &str) -> Result<()> {
    let client = ctx.connect().await?;
    if !client.with_store(|store| store.contains(id)) {
        bail!("Item not found: {}", id);
    }
    client.remove(id).await?;

    if ctx.json {
        println!("{}", serde_json::json!({ "removed": id }));
    } else {
        println!("{} Removed item: {}", "✓".green(), id);
    }
    Ok(())
}

pub fn config_show(ctx: &Context) -> Result<()> {
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        print!("{}", toml::to_string_pretty(&ctx.config)?);
    }
    Ok(())
}

pub fn config_init(ctx: &Context, force: bool) -> Result<()> {
    let path = ctx
        .config_path
        .as_ref()
        .context("Could not determine config directory; pass --config")?;
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default_with_comments())?;
    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}

pub fn config_path(ctx: &Context) -> Result<()> {
    match &ctx.config_path {
        Some(path) => println!("{}", path.display()),
        None => bail!("Could not determine config directory"),
    }
    Ok(())
}

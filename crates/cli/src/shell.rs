//! Menu-driven interactive shell over the domain operations.
//!
//! Every prompt reads one line. Operation failures are printed as
//! `Error: <message>` and the shell returns to the current menu; end of input
//! leaves the shell from any prompt.

use std::io::{self, Write};
use std::str::FromStr;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

use stockroom_core::{DomainError, Entity};
use stockroom_infra::{DocumentStore, Inventory, OperationError};
use stockroom_inventory::{Item, ItemKind, ItemPatch, User, UserPatch};

const INVALID_OPTION: &str = "Invalid option, please try again.";

#[derive(Debug, Error)]
enum ShellError {
    #[error("end of input")]
    Eof,

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Input(#[from] DomainError),
}

type ShellResult<T> = Result<T, ShellError>;

pub struct Shell<'a, S, R, W> {
    inventory: &'a Inventory<S>,
    input: Lines<R>,
    out: W,
}

impl<'a, S, R, W> Shell<'a, S, R, W>
where
    S: DocumentStore,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(inventory: &'a Inventory<S>, input: R, out: W) -> Self {
        Self {
            inventory,
            input: input.lines(),
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the main menu until the user exits or input ends.
    pub async fn run(&mut self) -> io::Result<()> {
        match self.main_menu().await {
            Ok(()) | Err(ShellError::Eof) => Ok(()),
            Err(ShellError::Io(e)) => Err(e),
            // Sub-menus report these themselves.
            Err(other) => Err(io::Error::other(other.to_string())),
        }
    }

    async fn main_menu(&mut self) -> ShellResult<()> {
        loop {
            let choice = self
                .menu(
                    "Main Menu",
                    &[
                        "1. User Actions",
                        "2. Item Actions",
                        "3. Material Actions",
                        "4. Tool Actions",
                        "5. Exit",
                    ],
                )
                .await?;

            match choice.as_str() {
                "1" => self.user_menu().await?,
                "2" => self.item_menu().await?,
                "3" => self.material_menu().await?,
                "4" => self.tool_menu().await?,
                "5" => return Ok(()),
                _ => writeln!(self.out, "{INVALID_OPTION}")?,
            }
        }
    }

    async fn user_menu(&mut self) -> ShellResult<()> {
        loop {
            let choice = self
                .menu(
                    "User Actions",
                    &[
                        "1. Create User",
                        "2. Find User",
                        "3. Update User",
                        "4. Delete User",
                        "5. List All Users",
                        "6. Use Item",
                        "7. Show Used Items",
                        "8. Build Something",
                        "0. Back to Main Menu",
                    ],
                )
                .await?;

            let result = match choice.as_str() {
                "1" => self.add_user().await,
                "2" => self.find_user().await,
                "3" => self.update_user().await,
                "4" => self.delete_user().await,
                "5" => self.list_users().await,
                "6" => self.use_item().await,
                "7" => self.show_used_items().await,
                "8" => self.build().await,
                "0" => return Ok(()),
                _ => self.say(INVALID_OPTION),
            };
            self.report(result)?;
        }
    }

    async fn item_menu(&mut self) -> ShellResult<()> {
        loop {
            let choice = self
                .menu(
                    "Item Actions",
                    &[
                        "1. Add Item",
                        "2. Find Item",
                        "3. Update Item",
                        "4. Delete Item",
                        "5. List All Items",
                        "6. Show Item Worth",
                        "7. Add Amount",
                        "0. Back to Main Menu",
                    ],
                )
                .await?;

            let result = match choice.as_str() {
                "1" => self.add_item().await,
                "2" => self.find_item().await,
                "3" => self.update_item().await,
                "4" => self.delete_item().await,
                "5" => self.list_items().await,
                "6" => self.show_worth().await,
                "7" => self.add_arrival().await,
                "0" => return Ok(()),
                _ => self.say(INVALID_OPTION),
            };
            self.report(result)?;
        }
    }

    async fn material_menu(&mut self) -> ShellResult<()> {
        loop {
            let choice = self
                .menu(
                    "Material Actions",
                    &[
                        "1. Add Material",
                        "2. Find Material",
                        "3. Update Material",
                        "4. Delete Material",
                        "5. List All Materials",
                        "6. Use Material",
                        "0. Back to Main Menu",
                    ],
                )
                .await?;

            let result = match choice.as_str() {
                "1" => self.add_material().await,
                "2" => self.find_material().await,
                "3" => self.update_material().await,
                "4" => self.delete_material().await,
                "5" => self.list_materials().await,
                "6" => self.use_material().await,
                "0" => return Ok(()),
                _ => self.say(INVALID_OPTION),
            };
            self.report(result)?;
        }
    }

    async fn tool_menu(&mut self) -> ShellResult<()> {
        loop {
            let choice = self
                .menu(
                    "Tool Actions",
                    &[
                        "1. Add Tool",
                        "2. Find Tool",
                        "3. Update Tool",
                        "4. Delete Tool",
                        "5. List All Tools",
                        "6. Use Tool",
                        "7. Fix Tool",
                        "0. Back to Main Menu",
                    ],
                )
                .await?;

            let result = match choice.as_str() {
                "1" => self.add_tool().await,
                "2" => self.find_tool().await,
                "3" => self.update_tool().await,
                "4" => self.delete_tool().await,
                "5" => self.list_tools().await,
                "6" => self.use_tool().await,
                "7" => self.fix_tool().await,
                "0" => return Ok(()),
                _ => self.say(INVALID_OPTION),
            };
            self.report(result)?;
        }
    }

    // --- users ---

    async fn add_user(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter user name: ").await?;
        let age = parse_number(&self.prompt("Enter user age: ").await?, "age")?;
        let added = self.inventory.users().add(&name, age).await?;
        match added {
            Some(user) => self.say(&format!("User added: {}", describe_user(&user))),
            None => self.say("User was not saved."),
        }
    }

    async fn find_user(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter user name to find: ").await?;
        let user = self.inventory.users().find(&name).await?;
        self.say(&format!("User found: {}", describe_user(&user)))
    }

    async fn update_user(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter user name to update: ").await?;
        let patch: UserPatch = self.prompt("Enter fields (name=..., age=...): ").await?.parse()?;
        let user = self.inventory.users().update(&name, &patch).await?;
        self.say(&format!("User updated: {}", describe_user(&user)))
    }

    async fn delete_user(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter user name to delete: ").await?;
        self.inventory.users().delete(&name).await?;
        self.say(&format!("User {name} deleted."))
    }

    async fn list_users(&mut self) -> ShellResult<()> {
        let users = self.inventory.users().list().await?;
        if users.is_empty() {
            return self.say("No users.");
        }
        for user in &users {
            writeln!(self.out, "{}", describe_user(user))?;
        }
        Ok(())
    }

    async fn use_item(&mut self) -> ShellResult<()> {
        let user = self.prompt("Enter user name: ").await?;
        let item = self.prompt("Enter item name: ").await?;
        let quantity = parse_number(&self.prompt("Enter quantity to use: ").await?, "quantity")?;
        let message = self.inventory.users().use_item(&user, &item, quantity).await?;
        self.say(&message)
    }

    async fn show_used_items(&mut self) -> ShellResult<()> {
        let user = self.prompt("Enter user name: ").await?;
        let used = self.inventory.users().used_items(&user).await?;
        self.say(&format!("{user} used: [{}]", used.join(", ")))
    }

    async fn build(&mut self) -> ShellResult<()> {
        let user = self.prompt("Enter user name: ").await?;
        let line = self
            .prompt("Enter items and amounts (format: name1,amount1,name2,amount2,...): ")
            .await?;
        let (names, amounts) = parse_build_list(&line)?;
        let report = self.inventory.users().build(&user, names, amounts).await?;
        self.say(&report.to_string())
    }

    // --- items ---

    async fn add_item(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter item name: ").await?;
        let amount = parse_number(&self.prompt("Enter item amount: ").await?, "amount")?;
        let cost = parse_number(&self.prompt("Enter item cost: ").await?, "cost")?;
        let added = self.inventory.items().add(&name, amount, cost).await?;
        self.say_added("Item", added.as_ref())
    }

    async fn find_item(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter item name to find: ").await?;
        let item = self.inventory.items().find(&name).await?;
        self.say(&format!("Item found: {}", describe_item(&item)))
    }

    async fn update_item(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter item name to update: ").await?;
        let patch = self.prompt_item_patch().await?;
        let item = self.inventory.items().update(&name, &patch).await?;
        self.say(&format!("Item updated: {}", describe_item(&item)))
    }

    async fn delete_item(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter item name to delete: ").await?;
        self.inventory.items().delete(&name).await?;
        self.say(&format!("Item {name} deleted."))
    }

    async fn list_items(&mut self) -> ShellResult<()> {
        let items = self.inventory.items().list().await?;
        self.say_items("No items.", &items)
    }

    async fn show_worth(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter item name: ").await?;
        let worth = self.inventory.items().worth(&name).await?;
        self.say(&format!("The worth of {name} is {worth}"))
    }

    async fn add_arrival(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter item name: ").await?;
        let delta = parse_number(&self.prompt("Enter amount to add: ").await?, "amount")?;
        let item = self.inventory.items().add_arrival(&name, delta).await?;
        self.say(&format!("{} now has {} in stock.", item.name(), item.amount()))
    }

    // --- materials ---

    async fn add_material(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter material name: ").await?;
        let amount = parse_number(&self.prompt("Enter material amount: ").await?, "amount")?;
        let cost = parse_number(&self.prompt("Enter material cost: ").await?, "cost")?;
        let supplier = self.prompt("Enter supplier: ").await?;
        let quality = self.prompt("Enter quality: ").await?;
        let added = self
            .inventory
            .materials()
            .add(&name, amount, cost, &supplier, &quality)
            .await?;
        self.say_added("Material", added.as_ref())
    }

    async fn find_material(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter material name to find: ").await?;
        let material = self.inventory.materials().find(&name).await?;
        self.say(&format!("Material found: {}", describe_item(&material)))
    }

    async fn update_material(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter material name to update: ").await?;
        let patch = self.prompt_item_patch().await?;
        let material = self.inventory.materials().update(&name, &patch).await?;
        self.say(&format!("Material updated: {}", describe_item(&material)))
    }

    async fn delete_material(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter material name to delete: ").await?;
        self.inventory.materials().delete(&name).await?;
        self.say(&format!("Material {name} deleted."))
    }

    async fn list_materials(&mut self) -> ShellResult<()> {
        let materials = self.inventory.materials().list().await?;
        self.say_items("No materials.", &materials)
    }

    async fn use_material(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter material name: ").await?;
        let quantity = parse_number(&self.prompt("Enter quantity to use: ").await?, "quantity")?;
        let material = self.inventory.materials().use_material(&name, quantity).await?;
        self.say(&format!(
            "Used {quantity} of {}, {} left.",
            material.name(),
            material.amount()
        ))
    }

    // --- tools ---

    async fn add_tool(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter tool name: ").await?;
        let amount = parse_number(&self.prompt("Enter tool amount: ").await?, "amount")?;
        let cost = parse_number(&self.prompt("Enter tool cost: ").await?, "cost")?;
        let usage = parse_number(&self.prompt("Enter usage (0-100): ").await?, "usage")?;
        let condition =
            parse_number(&self.prompt("Enter condition (0-100): ").await?, "condition")?;
        let added = self
            .inventory
            .tools()
            .add(&name, amount, cost, usage, condition)
            .await?;
        self.say_added("Tool", added.as_ref())
    }

    async fn find_tool(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter tool name to find: ").await?;
        let tool = self.inventory.tools().find(&name).await?;
        self.say(&format!("Tool found: {}", describe_item(&tool)))
    }

    async fn update_tool(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter tool name to update: ").await?;
        let patch = self.prompt_item_patch().await?;
        let tool = self.inventory.tools().update(&name, &patch).await?;
        self.say(&format!("Tool updated: {}", describe_item(&tool)))
    }

    async fn delete_tool(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter tool name to delete: ").await?;
        self.inventory.tools().delete(&name).await?;
        self.say(&format!("Tool {name} deleted."))
    }

    async fn list_tools(&mut self) -> ShellResult<()> {
        let tools = self.inventory.tools().list().await?;
        self.say_items("No tools.", &tools)
    }

    async fn use_tool(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter tool name: ").await?;
        let user = self.prompt("Enter user name: ").await?;
        let message = self.inventory.tools().use_tool(&name, &user).await?;
        self.say(&message)
    }

    async fn fix_tool(&mut self) -> ShellResult<()> {
        let name = self.prompt("Enter tool name: ").await?;
        let tool = self.inventory.tools().fix(&name).await?;
        let condition = tool.tool_spec().map_or(0, |spec| spec.condition);
        self.say(&format!("Tool {} fixed, condition {condition}.", tool.name()))
    }

    // --- io ---

    async fn menu(&mut self, title: &str, options: &[&str]) -> ShellResult<String> {
        writeln!(self.out)?;
        writeln!(self.out, "{title}")?;
        for option in options {
            writeln!(self.out, "{option}")?;
        }
        self.prompt("Choose an option: ").await
    }

    async fn prompt(&mut self, question: &str) -> ShellResult<String> {
        write!(self.out, "{question}")?;
        self.out.flush()?;
        match self.input.next_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(ShellError::Eof),
        }
    }

    async fn prompt_item_patch(&mut self) -> ShellResult<ItemPatch> {
        let line = self
            .prompt("Enter fields (name, amount, cost, supplier, quality, usage, condition as field=value): ")
            .await?;
        Ok(line.parse()?)
    }

    fn say(&mut self, line: &str) -> ShellResult<()> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    fn say_added(&mut self, kind: &str, added: Option<&Item>) -> ShellResult<()> {
        match added {
            Some(item) => self.say(&format!("{kind} added: {}", describe_item(item))),
            None => self.say(&format!("{kind} was not saved.")),
        }
    }

    fn say_items(&mut self, empty: &str, items: &[Item]) -> ShellResult<()> {
        if items.is_empty() {
            return self.say(empty);
        }
        for item in items {
            writeln!(self.out, "{}", describe_item(item))?;
        }
        Ok(())
    }

    /// Print a recoverable failure; hand back the ones that end the shell.
    fn report(&mut self, result: ShellResult<()>) -> ShellResult<()> {
        match result {
            Ok(()) => Ok(()),
            Err(fatal @ (ShellError::Eof | ShellError::Io(_))) => Err(fatal),
            Err(error) => {
                tracing::debug!(%error, "shell action failed");
                self.say(&format!("Error: {error}"))
            }
        }
    }
}

fn parse_number<T: FromStr>(text: &str, field: &str) -> Result<T, DomainError> {
    text.trim()
        .parse()
        .map_err(|_| DomainError::validation(format!("invalid {field}: {text:?}")))
}

/// Split `name1,amount1,name2,amount2,...` into names and amounts.
fn parse_build_list(line: &str) -> Result<(Vec<String>, Vec<i64>), DomainError> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if line.trim().is_empty() {
        return Err(DomainError::validation("no items given"));
    }

    let mut names = Vec::new();
    let mut amounts = Vec::new();
    for pair in parts.chunks(2) {
        let name = pair[0];
        let Some(amount) = pair.get(1) else {
            return Err(DomainError::validation(format!("missing amount for item: {name}")));
        };
        let amount = amount
            .parse()
            .map_err(|_| DomainError::validation(format!("invalid amount for item: {name}")))?;
        names.push(name.to_string());
        amounts.push(amount);
    }
    Ok((names, amounts))
}

fn describe_item(item: &Item) -> String {
    let mut line = format!(
        "{} [{}] amount: {}, cost: {}",
        item.name(),
        item.item_type(),
        item.amount(),
        item.cost()
    );
    match item.kind() {
        ItemKind::Item => {}
        ItemKind::Material(spec) => {
            line.push_str(&format!(", supplier: {}, quality: {}", spec.supplier, spec.quality));
        }
        ItemKind::Tool(spec) => {
            line.push_str(&format!(
                ", usage: {}, condition: {}, borrowed by {} user(s)",
                spec.usage,
                spec.condition,
                spec.borrowed_by.len()
            ));
        }
    }
    if !item.used_by().is_empty() {
        line.push_str(&format!(", used by: [{}]", item.used_by().join(", ")));
    }
    line
}

fn describe_user(user: &User) -> String {
    format!(
        "{} (age {}) used items: [{}]",
        user.name(),
        user.age(),
        user.used_items().join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_infra::InMemoryDocumentStore;

    async fn session(inventory: &Inventory<InMemoryDocumentStore>, script: &str) -> String {
        let mut shell = Shell::new(inventory, script.as_bytes(), Vec::new());
        shell.run().await.unwrap();
        String::from_utf8(shell.into_output()).unwrap()
    }

    #[test]
    fn build_list_pairs_names_with_amounts() {
        let (names, amounts) = parse_build_list("Wood, 5, Drill,1").unwrap();
        assert_eq!(names, ["Wood", "Drill"]);
        assert_eq!(amounts, [5, 1]);
    }

    #[test]
    fn build_list_rejects_bad_amounts() {
        assert!(parse_build_list("Wood,five").is_err());
        assert!(parse_build_list("Wood,5,Drill").is_err());
        assert!(parse_build_list("  ").is_err());
    }

    #[test]
    fn numbers_report_the_field() {
        let err = parse_number::<i64>("ten", "amount").unwrap_err();
        assert!(err.to_string().contains("invalid amount"));
        assert_eq!(parse_number::<f64>(" 2.5 ", "cost").unwrap(), 2.5);
    }

    #[tokio::test]
    async fn exits_from_main_menu() {
        let inventory = Inventory::new(InMemoryDocumentStore::new());
        let out = session(&inventory, "5\n").await;
        assert!(out.contains("Main Menu"));
        assert!(out.contains("5. Exit"));
    }

    #[tokio::test]
    async fn end_of_input_leaves_nested_menu() {
        let inventory = Inventory::new(InMemoryDocumentStore::new());
        let out = session(&inventory, "2\n1\nNails\n").await;
        assert!(out.contains("Enter item amount: "));
        assert!(inventory.items().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_choice_is_reported() {
        let inventory = Inventory::new(InMemoryDocumentStore::new());
        let out = session(&inventory, "9\n5\n").await;
        assert!(out.contains(INVALID_OPTION));
    }

    #[tokio::test]
    async fn item_session_adds_and_values_stock() {
        let inventory = Inventory::new(InMemoryDocumentStore::new());
        let script = "2\n1\nNails\n100\n2\n6\nNails\n7\nNails\n50\n0\n5\n";
        let out = session(&inventory, script).await;

        assert!(out.contains("Item added: Nails [Item] amount: 100, cost: 2"));
        assert!(out.contains("The worth of Nails is 200"));
        assert!(out.contains("Nails now has 150 in stock."));
        assert_eq!(inventory.items().find("Nails").await.unwrap().amount(), 150);
    }

    #[tokio::test]
    async fn failures_print_and_return_to_menu() {
        let inventory = Inventory::new(InMemoryDocumentStore::new());
        inventory
            .materials()
            .add("Wood", 10, 1.0, "Acme", "A")
            .await
            .unwrap();

        let script = "3\n6\nWood\n20\n2\nGlue\n6\nWood\nlots\n0\n5\n";
        let out = session(&inventory, script).await;

        assert!(out.contains("Error: not enough Wood available: requested 20, have 10"));
        assert!(out.contains("Error: material \"Glue\" not found"));
        assert!(out.contains("Error: validation failed: invalid quantity"));
        assert!(out.contains("Material Actions"));
        assert_eq!(inventory.materials().find("Wood").await.unwrap().amount(), 10);
    }

    #[tokio::test]
    async fn build_session_reports_usage() {
        let inventory = Inventory::new(InMemoryDocumentStore::new());
        inventory.users().add("Alice", 30).await.unwrap();
        inventory
            .materials()
            .add("Wood", 10, 1.0, "Acme", "A")
            .await
            .unwrap();
        inventory.tools().add("Drill", 1, 50.0, 0, 30).await.unwrap();

        let out = session(&inventory, "1\n8\nAlice\nWood,5,Drill,1\n7\nAlice\n0\n5\n").await;

        assert!(out.contains("Alice built something using tools: [Drill] and materials: [Wood x5]"));
        assert!(out.contains("Alice used: [Drill]"));
        let drill = inventory.tools().find("Drill").await.unwrap();
        assert_eq!(drill.tool_spec().unwrap().condition, 20);
    }

    #[tokio::test]
    async fn update_session_merges_fields() {
        let inventory = Inventory::new(InMemoryDocumentStore::new());
        inventory.tools().add("Saw", 1, 20.0, 0, 50).await.unwrap();

        let out = session(&inventory, "4\n3\nSaw\ncondition=80, cost=25\n7\nSaw\n0\n5\n").await;

        assert!(out.contains("Tool updated: Saw [Tool]"));
        assert!(out.contains("Tool Saw fixed, condition 100."));
        assert_eq!(inventory.tools().find("Saw").await.unwrap().cost(), 25.0);
    }
}

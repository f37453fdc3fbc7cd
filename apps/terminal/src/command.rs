//! Line commands typed by the user and their parsing.

use client_core::EditStep;
use shared::domain::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select { id: ItemId, step: EditStep },
    Add { id: ItemId },
    Delete { id: ItemId },
    Edit { id: ItemId },
    StepEdit(EditStep),
    Save,
    Update { id: ItemId, amount: u32 },
    Cancel,
    Checkout,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  plus <id> | minus <id>   change the amount selected for an inventory item
  add <id>                 add the selected amount to the cart
  delete <id>              remove a cart item
  edit <id>                edit a cart item amount
  edit+ | edit-            change the amount being edited
  save | cancel            commit or discard the edit
  update <id> <amount>     set a cart item amount directly
  checkout                 empty the cart
  show | help | quit";

pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("plus" | "+", [id]) => Command::Select {
            id: parse_id(id)?,
            step: EditStep::Increment,
        },
        ("minus" | "-", [id]) => Command::Select {
            id: parse_id(id)?,
            step: EditStep::Decrement,
        },
        ("add", [id]) => Command::Add { id: parse_id(id)? },
        ("delete" | "rm", [id]) => Command::Delete { id: parse_id(id)? },
        ("edit", [id]) => Command::Edit { id: parse_id(id)? },
        ("edit+", []) => Command::StepEdit(EditStep::Increment),
        ("edit-", []) => Command::StepEdit(EditStep::Decrement),
        ("save", []) => Command::Save,
        ("update", [id, amount]) => Command::Update {
            id: parse_id(id)?,
            amount: amount
                .parse()
                .map_err(|_| format!("amount must be a non-negative integer, got '{amount}'"))?,
        },
        ("cancel", []) => Command::Cancel,
        ("checkout", []) => Command::Checkout,
        ("show" | "ls", []) => Command::Show,
        ("help" | "?", []) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        (verb, _) => return Err(format!("unrecognized command '{verb}'; type 'help'")),
    };
    Ok(Some(command))
}

fn parse_id(raw: &str) -> Result<ItemId, String> {
    raw.parse()
        .map(ItemId)
        .map_err(|_| format!("item id must be an integer, got '{raw}'"))
}

//! Page markup for the HTML interface.

use maud::{html, Markup, DOCTYPE};
use shared::{Bank, FieldError};

use crate::flash::Flash;

/// Which form is being shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

impl FormMode {
    fn action(&self) -> String {
        match self {
            FormMode::Create => "/banks/new".to_string(),
            FormMode::Edit(id) => format!("/banks/{}/edit", id),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            FormMode::Create => "Add Bank",
            FormMode::Edit(_) => "Edit Bank",
        }
    }
}

/// Values shown in a form: blank, loaded from a bank, or echoed back after a failed submit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    pub name: String,
    pub location: String,
}

impl From<&Bank> for FormValues {
    fn from(bank: &Bank) -> Self {
        Self {
            name: bank.name.clone(),
            location: bank.location.clone(),
        }
    }
}

fn layout(title: &str, flash: Option<&Flash>, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " | Bank Registry" }
            }
            body {
                nav { a href="/" { "Banks" } " | " a href="/banks/new" { "Add bank" } }
                @if let Some(flash) = flash {
                    div class={ "flash flash-" (flash.level.as_str()) } role="status" { (flash.message) }
                }
                main {
                    h1 { (title) }
                    (body)
                }
            }
        }
    }
}

pub fn bank_list(banks: &[Bank], flash: Option<&Flash>) -> Markup {
    layout(
        "Banks",
        flash,
        html! {
            @if banks.is_empty() {
                p class="empty" { "No banks found." }
            } @else {
                table {
                    thead { tr { th { "ID" } th { "Name" } th { "Location" } th { "Actions" } } }
                    tbody {
                        @for bank in banks {
                            tr {
                                td { (bank.id) }
                                td { a href={ "/banks/" (bank.id) } { (bank.name) } }
                                td { (bank.location) }
                                td {
                                    a href={ "/banks/" (bank.id) "/edit" } { "Edit" }
                                    " "
                                    (delete_button(bank.id))
                                }
                            }
                        }
                    }
                }
            }
            p { a href="/banks/new" { "Add a new bank" } }
        },
    )
}

pub fn bank_detail(bank: &Bank, flash: Option<&Flash>) -> Markup {
    layout(
        &bank.name,
        flash,
        html! {
            dl {
                dt { "ID" } dd { (bank.id) }
                dt { "Name" } dd { (bank.name) }
                dt { "Location" } dd { (bank.location) }
            }
            p {
                a href={ "/banks/" (bank.id) "/edit" } { "Edit" }
                " "
                (delete_button(bank.id))
            }
            p { a href="/" { "Back to list" } }
        },
    )
}

pub fn bank_form(
    mode: FormMode,
    values: &FormValues,
    errors: &[FieldError],
    flash: Option<&Flash>,
) -> Markup {
    let error_for = |field: &str| errors.iter().find(|e| e.field == field);

    layout(
        mode.title(),
        flash,
        html! {
            @if !errors.is_empty() {
                div class="form-errors" role="alert" {
                    "Please correct the errors below."
                }
            }
            form method="post" action=(mode.action()) {
                p {
                    label for="name" { "Name" }
                    input type="text" id="name" name="name" value=(values.name) required;
                    @if let Some(err) = error_for("name") {
                        span class="field-error" { (err.to_string()) }
                    }
                }
                p {
                    label for="location" { "Location" }
                    input type="text" id="location" name="location" value=(values.location) required;
                    @if let Some(err) = error_for("location") {
                        span class="field-error" { (err.to_string()) }
                    }
                }
                button type="submit" { "Save" }
                " "
                a href="/" { "Cancel" }
            }
        },
    )
}

pub fn not_found(message: &str) -> Markup {
    layout(
        "Not Found",
        None,
        html! {
            p { (message) }
            p { a href="/" { "Back to list" } }
        },
    )
}

pub fn error_page(message: &str) -> Markup {
    layout(
        "Something went wrong",
        None,
        html! {
            p { (message) }
            p { a href="/" { "Back to list" } }
        },
    )
}

fn delete_button(id: i64) -> Markup {
    html! {
        form method="post" action={ "/banks/" (id) "/delete" } class="inline" {
            button type="submit" { "Delete" }
        }
    }
}

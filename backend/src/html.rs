//! Server-rendered pages and form handling for banks.

use std::any::Any;

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use maud::Markup;
use serde::Deserialize;
use shared::{CreateBankRequest, UpdateBankRequest};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info, warn};

use crate::error::BankError;
use crate::flash::{self, Flash};
use crate::views::{self, FormMode, FormValues};
use crate::AppState;

const LIST_PAGE: &str = "/";

/// Fields posted by the create and edit forms
#[derive(Debug, Default, Deserialize)]
pub struct BankForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
}

impl From<&BankForm> for FormValues {
    fn from(form: &BankForm) -> Self {
        Self {
            name: form.name.clone(),
            location: form.location.clone(),
        }
    }
}

/// Create the HTML router
pub fn router() -> Router<AppState> {
    with_error_pages(
        Router::new()
            .route("/", get(list_page))
            .route("/banks", get(list_page))
            .route("/banks/new", get(new_form).post(create_submit))
            .route("/banks/:id", get(detail_page))
            .route("/banks/:id/edit", get(edit_form).post(edit_submit))
            .route("/banks/:id/delete", post(delete_submit)),
    )
}

/// Not-found page for unknown paths and an HTML 500 for panics
fn with_error_pages(routes: Router<AppState>) -> Router<AppState> {
    routes
        .fallback(unknown_page)
        .layer(CatchPanicLayer::custom(panic_page))
}

/// A rendered page; the jar carries the removal of any flash it displayed
fn page(status: StatusCode, jar: SignedCookieJar, markup: Markup) -> Response {
    (status, jar, markup).into_response()
}

fn redirect_with_flash(jar: SignedCookieJar, flash: Flash) -> Response {
    (flash::push(jar, &flash), Redirect::to(LIST_PAGE)).into_response()
}

fn not_found_page(raw_id: &str) -> Response {
    let markup = views::not_found(&format!("Bank with id {} not found", raw_id));
    (StatusCode::NOT_FOUND, markup).into_response()
}

fn error_page(err: &BankError) -> Response {
    error!("Page request failed: {:?}", err);
    let markup = views::error_page(&err.public_message());
    (StatusCode::INTERNAL_SERVER_ERROR, markup).into_response()
}

/// Map a failed lookup to the not-found or generic error page
fn lookup_failure(raw_id: &str, err: BankError) -> Response {
    match err {
        BankError::NotFound(_) => not_found_page(raw_id),
        other => error_page(&other),
    }
}

/// GET / and GET /banks
async fn list_page(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    info!("GET / - bank list");
    let (jar, flash) = flash::take(jar);

    match state.bank_service.list().await {
        Ok(banks) => page(StatusCode::OK, jar, views::bank_list(&banks, flash.as_ref())),
        Err(err) => error_page(&err),
    }
}

/// GET /banks/:id
async fn detail_page(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(raw_id): Path<String>,
) -> Response {
    info!("GET /banks/{}", raw_id);
    let Ok(id) = raw_id.parse::<i64>() else {
        return not_found_page(&raw_id);
    };
    let (jar, flash) = flash::take(jar);

    match state.bank_service.get(id).await {
        Ok(bank) => page(StatusCode::OK, jar, views::bank_detail(&bank, flash.as_ref())),
        Err(err) => lookup_failure(&raw_id, err),
    }
}

/// GET /banks/new
async fn new_form(jar: SignedCookieJar) -> Response {
    info!("GET /banks/new");
    let (jar, flash) = flash::take(jar);
    let markup = views::bank_form(FormMode::Create, &FormValues::default(), &[], flash.as_ref());
    page(StatusCode::OK, jar, markup)
}

/// POST /banks/new
async fn create_submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    form: Result<Form<BankForm>, FormRejection>,
) -> Response {
    info!("POST /banks/new");
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return bad_form(rejection),
    };

    let request = CreateBankRequest {
        name: form.name.clone(),
        location: form.location.clone(),
    };
    match state.bank_service.create(request).await {
        Ok(_) => redirect_with_flash(jar, Flash::success("Bank created successfully!")),
        Err(BankError::InvalidInput(errors)) => {
            warn!("Rejected bank form: {:?}", errors);
            let markup = views::bank_form(FormMode::Create, &FormValues::from(&form), &errors, None);
            (StatusCode::BAD_REQUEST, markup).into_response()
        }
        Err(err) => {
            error!("Failed to create bank: {:?}", err);
            redirect_with_flash(jar, Flash::error("Could not create bank. Please try again."))
        }
    }
}

/// GET /banks/:id/edit
async fn edit_form(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(raw_id): Path<String>,
) -> Response {
    info!("GET /banks/{}/edit", raw_id);
    let Ok(id) = raw_id.parse::<i64>() else {
        return not_found_page(&raw_id);
    };
    let (jar, flash) = flash::take(jar);

    match state.bank_service.get(id).await {
        Ok(bank) => {
            let markup = views::bank_form(FormMode::Edit(id), &FormValues::from(&bank), &[], flash.as_ref());
            page(StatusCode::OK, jar, markup)
        }
        Err(err) => lookup_failure(&raw_id, err),
    }
}

/// POST /banks/:id/edit
async fn edit_submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(raw_id): Path<String>,
    form: Result<Form<BankForm>, FormRejection>,
) -> Response {
    info!("POST /banks/{}/edit", raw_id);
    let Ok(id) = raw_id.parse::<i64>() else {
        return not_found_page(&raw_id);
    };
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => return bad_form(rejection),
    };

    // The form always posts both fields, so an empty one is a validation error
    let request = UpdateBankRequest {
        name: Some(form.name.clone()),
        location: Some(form.location.clone()),
    };
    match state.bank_service.update(id, request).await {
        Ok(_) => redirect_with_flash(jar, Flash::success("Bank updated successfully!")),
        Err(BankError::InvalidInput(errors)) => {
            warn!("Rejected bank form for {}: {:?}", id, errors);
            let markup = views::bank_form(FormMode::Edit(id), &FormValues::from(&form), &errors, None);
            (StatusCode::BAD_REQUEST, markup).into_response()
        }
        Err(BankError::NotFound(_)) => not_found_page(&raw_id),
        Err(err) => {
            error!("Failed to update bank {}: {:?}", id, err);
            redirect_with_flash(jar, Flash::error("Could not update bank. Please try again."))
        }
    }
}

/// POST /banks/:id/delete
async fn delete_submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(raw_id): Path<String>,
) -> Response {
    info!("POST /banks/{}/delete", raw_id);
    let Ok(id) = raw_id.parse::<i64>() else {
        return not_found_page(&raw_id);
    };

    match state.bank_service.delete(id).await {
        Ok(()) => redirect_with_flash(jar, Flash::success("Bank deleted successfully!")),
        Err(BankError::NotFound(_)) => not_found_page(&raw_id),
        Err(err) => {
            error!("Failed to delete bank {}: {:?}", id, err);
            redirect_with_flash(jar, Flash::error("Could not delete bank. Please try again."))
        }
    }
}

async fn unknown_page() -> Response {
    (StatusCode::NOT_FOUND, views::not_found("Page not found")).into_response()
}

fn bad_form(rejection: FormRejection) -> Response {
    warn!("Unreadable form submission: {}", rejection.body_text());
    let markup = views::error_page("The submitted form could not be read.");
    (StatusCode::BAD_REQUEST, markup).into_response()
}

fn panic_page(_payload: Box<dyn Any + Send + 'static>) -> Response {
    error!("Panic while rendering a page");
    let markup = views::error_page("Internal server error");
    (StatusCode::INTERNAL_SERVER_ERROR, markup).into_response()
}

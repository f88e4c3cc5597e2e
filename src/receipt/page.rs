//! The receipts page with the upload form and recent scans.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::UserID,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        base, format_currency, loading_spinner, page_header,
    },
    navigation::NavBar,
    receipt::{RECENT_SCAN_LIMIT, ReceiptScan, get_recent_receipt_scans},
};

/// The state needed for the receipts page.
#[derive(Debug, Clone)]
pub struct ReceiptsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ReceiptsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

pub async fn get_receipts_page(
    State(state): State<ReceiptsPageState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let scans = get_recent_receipt_scans(user_id, RECENT_SCAN_LIMIT, &connection)
        .inspect_err(|error| tracing::error!("Could not get receipt scans: {error}"))?;

    Ok(receipts_view(&scans).into_response())
}

fn upload_form() -> Markup {
    html!(
        form
            hx-post=(endpoints::SCAN_RECEIPT)
            hx-encoding="multipart/form-data"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class={ (CARD_STYLE) " w-full space-y-4" }
        {
            label for="receipt" class=(FORM_LABEL_STYLE) { "Receipt photo" }

            input
                type="file"
                name="receipt"
                id="receipt"
                accept="image/*"
                required
                class="block w-full text-sm text-gray-900 dark:text-gray-300"
            ;

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (loading_spinner()) }
                "Scan Receipt"
            }
        }
    )
}

fn scan_card(scan: &ReceiptScan) -> Markup {
    let convert_url = format_endpoint(endpoints::CONVERT_RECEIPT, scan.id);

    html!(
        div class=(CARD_STYLE) data-receipt-scan=(scan.id)
        {
            div class="flex justify-between items-baseline"
            {
                h3 class="font-semibold" { (scan.detected_merchant) }
                span class="text-lg font-bold" { (format_currency(scan.detected_amount)) }
            }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                (scan.filename) " · "
                (scan.suggested_category_name.as_deref().unwrap_or("No category"))
                " · "
                (format!("{:.0}% confidence", scan.confidence_score * 100.0))
            }

            div class="mt-2 text-sm"
            {
                @if scan.is_processed {
                    span class="text-green-600 dark:text-green-400" data-processed { "Added as expense" }
                } @else {
                    button
                        type="button"
                        hx-post=(convert_url)
                        hx-target-error="#alert-container"
                        class=(LINK_STYLE)
                    {
                        "Add as expense"
                    }
                }
            }
        }
    )
}

fn receipts_view(scans: &[ReceiptScan]) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECEIPTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            (page_header("Receipt Scanner", None))
            (upload_form())

            section class="w-full space-y-4"
            {
                h2 class="text-lg font-semibold" { "Recent Scans" }

                @for scan in scans {
                    (scan_card(scan))
                }

                @if scans.is_empty() {
                    p class="text-gray-600 dark:text-gray-300" { "No receipts scanned yet." }
                }
            }
        }
    );

    base("Receipts", &[], &content)
}

#[cfg(test)]
mod receipts_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, extract::State, http::StatusCode};
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        endpoints,
        receipt::{convert_receipt_scan, scan_receipt},
        test_utils::{
            assert_form_input, assert_hx_endpoint, assert_valid_html, create_test_user,
            get_test_connection, must_get_form, parse_html_document,
        },
    };

    use super::{ReceiptsPageState, get_receipts_page};

    #[tokio::test]
    async fn lists_scans_with_convert_buttons() {
        let connection = get_test_connection();
        let user = create_test_user(&connection);
        let converted = scan_receipt(user.id, "a.jpg", b"first", &connection).unwrap();
        convert_receipt_scan(converted.id, user.id, date!(2025 - 01 - 01), &connection).unwrap();
        scan_receipt(user.id, "b.jpg", b"second", &connection).unwrap();
        let state = ReceiptsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_receipts_page(State(state), Extension(user.id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::SCAN_RECEIPT, "hx-post");
        assert_form_input(&form, "receipt", "file");
        let scans = html
            .select(&Selector::parse("[data-receipt-scan]").unwrap())
            .count();
        assert_eq!(scans, 2);
        let processed = html
            .select(&Selector::parse("[data-processed]").unwrap())
            .count();
        assert_eq!(processed, 1);
    }
}

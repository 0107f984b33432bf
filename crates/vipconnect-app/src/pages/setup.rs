// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session setup page — patron and transaction form, mirroring what a host
// app collects before launching the cashier.

use dioxus::prelude::*;

use vipconnect_core::types::{PatronType, ProductType, TransactionType};

use crate::Route;
use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Setup() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let nav = use_navigator();

    let is_new_patron = state.read().patron_type == PatronType::New;

    rsx! {
        div {
            h1 { "VIP Connect Demo" }
            p { style: "color: #666; font-size: 14px;",
                "Environment: {svc.config().base_uri} — mock backend {state.read().server_status:?}"
            }

            section { style: "margin: 16px 0;",
                h3 { "Patron" }
                FormRow { label: "Patron type",
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: if is_new_patron { "new" } else { "existing" },
                        onchange: move |evt| {
                            let patron_type = if evt.value() == "new" {
                                PatronType::New
                            } else {
                                PatronType::Existing
                            };
                            state.write().set_patron_type(patron_type);
                        },
                        option { value: "existing", "Existing patron" }
                        option { value: "new", "New patron (enrollment)" }
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Transaction" }
                FormRow { label: "Direction",
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: state.read().transaction_type.mode_param(),
                        // Enrollment only supports deposits.
                        disabled: is_new_patron,
                        onchange: move |evt| {
                            state.write().transaction_type = if evt.value() == "withdraw" {
                                TransactionType::Withdraw
                            } else {
                                TransactionType::Deposit
                            };
                        },
                        option { value: "deposit", "Deposit" }
                        option { value: "withdraw", "Withdraw" }
                    }
                }
                FormRow { label: "Amount",
                    input {
                        r#type: "number",
                        style: "width: 100px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px; text-align: right;",
                        value: "{state.read().amount}",
                        onchange: move |evt| {
                            state.write().amount = evt.value();
                        },
                    }
                }
                FormRow { label: "Product",
                    select {
                        style: "padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: state.read().product_type.as_str(),
                        onchange: move |evt| {
                            state.write().product_type = if evt.value() == "online" {
                                ProductType::Online
                            } else {
                                ProductType::Preferred
                            };
                        },
                        option { value: "preferred", "Preferred" }
                        option { value: "online", "Online" }
                    }
                }
                FormRow { label: "Full cashier experience",
                    input {
                        r#type: "checkbox",
                        checked: state.read().cashier_mode,
                        onchange: move |evt| {
                            state.write().cashier_mode = evt.checked();
                        },
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Credentials" }
                FormRow { label: "Operator token (optional)",
                    input {
                        r#type: "text",
                        placeholder: "leave empty to mint locally",
                        style: "width: 260px; padding: 4px 8px; border: 1px solid #ccc; border-radius: 4px;",
                        value: "{state.read().external_token}",
                        onchange: move |evt| {
                            state.write().external_token = evt.value();
                        },
                    }
                }
            }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #007aff; color: white; font-size: 16px; margin-top: 8px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        let svc = svc.clone();
                        let snapshot = state.read().clone();

                        let Ok(amount) = snapshot.amount.parse::<f64>() else {
                            state.write().status_message =
                                Some(format!("Invalid amount: {}", snapshot.amount));
                            return;
                        };

                        spawn(async move {
                            let external_token = (!snapshot.external_token.trim().is_empty())
                                .then(|| snapshot.external_token.trim().to_owned());
                            let result = svc
                                .launch_session(
                                    snapshot.patron_type,
                                    snapshot.transaction_type,
                                    amount,
                                    snapshot.product_type,
                                    snapshot.cashier_mode,
                                    external_token,
                                )
                                .await;

                            match result {
                                Ok(view) => {
                                    tracing::info!(session_id = %view.session_id, "session launched");
                                    let mut s = state.write();
                                    s.session = Some(view);
                                    s.server_status = svc.server_status();
                                    s.bridge_log = svc.bridge_log();
                                    s.status_message = None;
                                    drop(s);
                                    nav.push(Route::Session {});
                                }
                                Err(e) => {
                                    tracing::error!(error = %e, "session launch failed");
                                    let mut s = state.write();
                                    s.server_status = svc.server_status();
                                    s.status_message = Some(format!("Launch failed: {e}"));
                                }
                            }
                        });
                    }
                },
                "Launch Cashier Session"
            }

            if let Some(ref msg) = state.read().status_message {
                p { style: "color: #ff3b30; font-size: 14px; text-align: center; margin-top: 8px;",
                    "{msg}"
                }
            }
        }
    }
}

#[component]
fn FormRow(label: &'static str, children: Element) -> Element {
    rsx! {
        div { style: "display: flex; justify-content: space-between; align-items: center; padding: 12px 0; border-bottom: 1px solid #f0f0f0;",
            span { "{label}" }
            {children}
        }
    }
}

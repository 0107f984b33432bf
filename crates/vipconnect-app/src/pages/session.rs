// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session page — bridge console for the active cashier session.
//
// On a device the webview would render the cashier here. The desktop demo
// shows the session URL and a console instead, with buttons that inject the
// three page payloads the bridge understands, so the whole native side of
// the protocol can be exercised end to end.

use dioxus::prelude::*;

use crate::Route;
use crate::services::app_services::AppServices;
use crate::state::AppState;

#[component]
pub fn Session() -> Element {
    let mut state = use_context::<Signal<AppState>>();
    let svc = use_context::<AppServices>();
    let nav = use_navigator();

    let Some(session) = state.read().session.clone() else {
        return rsx! {
            div {
                h1 { "No active session" }
                button {
                    style: "padding: 8px 16px; border-radius: 8px; border: 1px solid #ccc;",
                    onclick: move |_| { nav.push(Route::Setup {}); },
                    "Back to setup"
                }
            }
        };
    };

    let refresh = {
        let svc = svc.clone();
        move |mut state: Signal<AppState>| {
            state.write().bridge_log = svc.bridge_log();
        }
    };

    rsx! {
        div {
            h1 { "Cashier Session" }
            p { style: "color: #666; font-size: 13px; word-break: break-all;",
                "Session {session.session_id}"
                br {}
                "{session.session_url}"
            }

            section { style: "margin: 16px 0;",
                h3 { "Simulated page messages" }
                div { style: "display: flex; gap: 8px; flex-wrap: wrap;",
                    ConsoleButton {
                        label: "Send linkToken",
                        onclick: {
                            let svc = svc.clone();
                            let refresh = refresh.clone();
                            move |_| { svc.send_link_token(); refresh(state); }
                        },
                    }
                    ConsoleButton {
                        label: "Send close",
                        onclick: {
                            let svc = svc.clone();
                            let refresh = refresh.clone();
                            move |_| { svc.send_close(); refresh(state); }
                        },
                    }
                    ConsoleButton {
                        label: "Send opensdk",
                        onclick: {
                            let svc = svc.clone();
                            let refresh = refresh.clone();
                            move |_| { svc.send_fullscreen(); refresh(state); }
                        },
                    }
                }
            }

            section { style: "margin: 16px 0;",
                h3 { "Bridge console" }
                div { style: "background: #1e1e1e; color: #d4d4d4; font-family: ui-monospace, monospace; font-size: 12px; padding: 12px; border-radius: 8px; min-height: 160px; max-height: 320px; overflow-y: auto;",
                    if state.read().bridge_log.is_empty() {
                        p { style: "color: #888;", "(no bridge traffic yet)" }
                    }
                    for line in state.read().bridge_log.iter() {
                        div { "{line}" }
                    }
                }
            }

            button {
                style: "width: 100%; padding: 12px; border-radius: 8px; border: none; background: #ff3b30; color: white; font-size: 16px; margin-top: 8px;",
                onclick: {
                    let svc = svc.clone();
                    move |_| {
                        svc.end_session();
                        let mut s = state.write();
                        s.session = None;
                        s.bridge_log = svc.bridge_log();
                        drop(s);
                        nav.push(Route::Setup {});
                    }
                },
                "End Session"
            }
        }
    }
}

#[component]
fn ConsoleButton(label: &'static str, onclick: EventHandler<MouseEvent>) -> Element {
    rsx! {
        button {
            style: "padding: 8px 16px; border-radius: 8px; border: 1px solid #ccc; background: #fafafa;",
            onclick: move |evt| onclick.call(evt),
            "{label}"
        }
    }
}

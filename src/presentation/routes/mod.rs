// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::presentation::handlers::{
    auth_handler, billing_handler, catalog_handler, crm_handler, ledger_handler,
    outreach_handler, portal_handler, renewal_handler, ticket_handler, tracking_handler,
    webhook_handler,
};
use crate::presentation::middleware::auth_middleware::auth_middleware;
use crate::presentation::state::AppState;

/// 创建应用路由
///
/// 公开路由：健康检查、登录注册、邮件追踪与渠道回调；
/// `/api` 需要员工令牌，`/portal` 需要门户令牌。
pub fn routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/version", get(version))
        .route("/api/auth/register", post(auth_handler::register))
        .route("/api/auth/login", post(auth_handler::login))
        .route("/portal/auth/login", post(auth_handler::portal_login))
        .route("/t/o/{token}", get(tracking_handler::open_pixel))
        .route("/t/c/{token}", get(tracking_handler::click))
        .route("/unsubscribe/{token}", get(tracking_handler::unsubscribe))
        .route("/webhooks/stripe", post(webhook_handler::stripe))
        .route("/webhooks/paypal", post(webhook_handler::paypal))
        .route("/webhooks/sendgrid", post(webhook_handler::sendgrid))
        .route("/webhooks/mailgun", post(webhook_handler::mailgun));

    let auth_layer = middleware::from_fn_with_state(state.clone(), auth_middleware);

    Router::new()
        .merge(public_routes)
        .merge(staff_routes().route_layer(auth_layer.clone()))
        .merge(portal_routes().route_layer(auth_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn staff_routes() -> Router<AppState> {
    Router::new()
        // users
        .route("/api/auth/me", get(auth_handler::me))
        .route(
            "/api/users",
            get(auth_handler::list_users).post(auth_handler::create_user),
        )
        .route("/api/portal-users", post(auth_handler::create_portal_user))
        // crm
        .route(
            "/api/accounts",
            get(crm_handler::list_accounts).post(crm_handler::create_account),
        )
        .route(
            "/api/accounts/{id}",
            get(crm_handler::get_account).put(crm_handler::update_account),
        )
        .route("/api/accounts/{id}/history", get(crm_handler::account_history))
        .route(
            "/api/contacts",
            get(crm_handler::list_contacts).post(crm_handler::create_contact),
        )
        .route(
            "/api/contacts/{id}",
            get(crm_handler::get_contact).put(crm_handler::update_contact),
        )
        .route(
            "/api/deals",
            get(crm_handler::list_deals).post(crm_handler::create_deal),
        )
        .route("/api/deals/{id}", get(crm_handler::get_deal))
        .route("/api/deals/{id}/stage", post(crm_handler::move_deal))
        // catalog
        .route(
            "/api/products",
            get(catalog_handler::list_products).post(catalog_handler::create_product),
        )
        .route(
            "/api/products/{id}",
            get(catalog_handler::get_product).put(catalog_handler::update_product),
        )
        .route(
            "/api/bundles",
            get(catalog_handler::list_bundles).post(catalog_handler::create_bundle),
        )
        .route("/api/bundles/{id}/lines", get(catalog_handler::expand_bundle))
        .route(
            "/api/discounts",
            get(catalog_handler::list_discounts).post(catalog_handler::create_discount),
        )
        .route(
            "/api/discounts/{code}/active",
            put(catalog_handler::set_discount_active),
        )
        // quotes
        .route(
            "/api/quotes",
            get(billing_handler::list_quotes).post(billing_handler::create_quote),
        )
        .route("/api/quotes/{id}", get(billing_handler::get_quote))
        .route("/api/quotes/{id}/send", post(billing_handler::send_quote))
        .route("/api/quotes/{id}/accept", post(billing_handler::accept_quote))
        .route("/api/quotes/{id}/decline", post(billing_handler::decline_quote))
        .route("/api/quotes/{id}/convert", post(billing_handler::convert_quote))
        // invoices
        .route(
            "/api/invoices",
            get(billing_handler::list_invoices).post(billing_handler::create_invoice),
        )
        .route("/api/invoices/{id}", get(billing_handler::get_invoice))
        .route("/api/invoices/{id}/issue", post(billing_handler::issue_invoice))
        .route("/api/invoices/{id}/void", post(billing_handler::void_invoice))
        .route(
            "/api/invoices/{id}/payments",
            get(billing_handler::list_payments).post(billing_handler::record_payment),
        )
        .route("/api/invoices/{id}/refunds", post(billing_handler::record_refund))
        // renewals and time
        .route(
            "/api/renewals",
            get(renewal_handler::list_renewals).post(renewal_handler::create_renewal),
        )
        .route("/api/renewals/upcoming", get(renewal_handler::upcoming_renewals))
        .route("/api/renewals/{id}", get(renewal_handler::get_renewal))
        .route("/api/renewals/{id}/renew", post(renewal_handler::renew))
        .route(
            "/api/renewals/{id}/recognize",
            post(renewal_handler::recognize_revenue),
        )
        .route("/api/renewals/{id}/cancel", post(renewal_handler::cancel_renewal))
        .route(
            "/api/time-entries",
            get(renewal_handler::list_time).post(renewal_handler::log_time),
        )
        // ledger
        .route(
            "/api/ledger/accounts",
            get(ledger_handler::list_accounts).post(ledger_handler::create_account),
        )
        .route(
            "/api/ledger/accounts/{code}/active",
            put(ledger_handler::set_account_active),
        )
        .route(
            "/api/ledger/accounts/{code}/activity",
            get(ledger_handler::account_activity),
        )
        .route(
            "/api/ledger/periods",
            get(ledger_handler::list_periods).post(ledger_handler::create_period),
        )
        .route(
            "/api/ledger/periods/{id}/status",
            put(ledger_handler::transition_period),
        )
        .route(
            "/api/ledger/entries",
            get(ledger_handler::list_entries).post(ledger_handler::post_manual),
        )
        .route("/api/ledger/entries/{id}", get(ledger_handler::get_entry))
        .route(
            "/api/ledger/entries/{id}/reverse",
            post(ledger_handler::reverse_entry),
        )
        .route(
            "/api/ledger/reports/trial-balance",
            get(ledger_handler::trial_balance),
        )
        // support
        .route(
            "/api/tickets",
            get(ticket_handler::list_tickets).post(ticket_handler::create_ticket),
        )
        .route(
            "/api/tickets/{id}",
            get(ticket_handler::get_ticket).patch(ticket_handler::update_ticket),
        )
        .route(
            "/api/tickets/{id}/comments",
            get(ticket_handler::list_comments).post(ticket_handler::add_comment),
        )
        // outreach
        .route(
            "/api/outreach/templates",
            get(outreach_handler::list_templates).post(outreach_handler::create_template),
        )
        .route(
            "/api/outreach/sequences",
            get(outreach_handler::list_sequences).post(outreach_handler::create_sequence),
        )
        .route(
            "/api/outreach/sequences/{id}/enrollments",
            get(outreach_handler::list_enrollments).post(outreach_handler::enroll),
        )
        .route(
            "/api/outreach/enrollments/{id}/cancel",
            post(outreach_handler::cancel_enrollment),
        )
        .route(
            "/api/campaigns",
            get(outreach_handler::list_campaigns).post(outreach_handler::create_campaign),
        )
        .route("/api/campaigns/{id}", get(outreach_handler::get_campaign))
        .route("/api/campaigns/{id}/send", post(outreach_handler::send_campaign))
        .route("/api/campaigns/{id}/stats", get(outreach_handler::campaign_stats))
}

fn portal_routes() -> Router<AppState> {
    Router::new()
        .route("/portal/me", get(portal_handler::me))
        .route("/portal/invoices", get(portal_handler::list_invoices))
        .route("/portal/invoices/{id}", get(portal_handler::get_invoice))
        .route("/portal/quotes", get(portal_handler::list_quotes))
        .route("/portal/quotes/{id}/accept", post(portal_handler::accept_quote))
        .route("/portal/quotes/{id}/decline", post(portal_handler::decline_quote))
        .route(
            "/portal/tickets",
            get(portal_handler::list_tickets).post(portal_handler::create_ticket),
        )
        .route("/portal/tickets/{id}", get(portal_handler::get_ticket))
        .route(
            "/portal/tickets/{id}/comments",
            get(portal_handler::list_comments).post(portal_handler::add_comment),
        )
}

/// 健康检查端点
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

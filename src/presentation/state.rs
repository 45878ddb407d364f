// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::settings::Settings;
use crate::domain::services::auth_service::{AuthPolicy, AuthService};
use crate::domain::services::campaign_service::CampaignService;
use crate::domain::services::catalog_service::CatalogService;
use crate::domain::services::crm_service::CrmService;
use crate::domain::services::delivery_service::DeliveryService;
use crate::domain::services::email_service::{EmailProvider, Mailer, SmsProvider};
use crate::domain::services::invoice_service::InvoiceService;
use crate::domain::services::ledger_service::LedgerService;
use crate::domain::services::outreach_service::OutreachService;
use crate::domain::services::payment_webhook_service::{PaymentWebhookService, PaypalVerifier};
use crate::domain::services::quote_service::QuoteService;
use crate::domain::services::renewal_service::RenewalService;
use crate::domain::services::ticket_service::TicketService;
use crate::domain::services::time_entry_service::TimeEntryService;
use crate::domain::services::tracking_service::TrackingService;
use crate::infrastructure::repositories::catalog_repo_impl::CatalogRepoImpl;
use crate::infrastructure::repositories::crm_repo_impl::CrmRepoImpl;
use crate::infrastructure::repositories::invoice_repo_impl::InvoiceRepoImpl;
use crate::infrastructure::repositories::ledger_repo_impl::LedgerRepoImpl;
use crate::infrastructure::repositories::outreach_repo_impl::OutreachRepoImpl;
use crate::infrastructure::repositories::payment_event_repo_impl::PaymentEventRepoImpl;
use crate::infrastructure::repositories::quote_repo_impl::QuoteRepoImpl;
use crate::infrastructure::repositories::renewal_repo_impl::{RenewalRepoImpl, TimeEntryRepoImpl};
use crate::infrastructure::repositories::sequence_repo_impl::SequenceRepoImpl;
use crate::infrastructure::repositories::tenant_repo_impl::{
    PortalUserRepoImpl, TenantRepoImpl, UserRepoImpl,
};
use crate::infrastructure::repositories::ticket_repo_impl::TicketRepoImpl;
use crate::utils::tokens::TokenSigner;

/// 外部渠道
#[derive(Clone)]
pub struct Providers {
    pub email: Arc<dyn EmailProvider>,
    pub sms: Option<Arc<dyn SmsProvider>>,
    pub paypal: Option<Arc<dyn PaypalVerifier>>,
}

/// 处理器共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: Arc<AuthService>,
    pub crm: Arc<CrmService>,
    pub catalog: Arc<CatalogService>,
    pub quotes: Arc<QuoteService>,
    pub invoices: Arc<InvoiceService>,
    pub ledger: Arc<LedgerService>,
    pub renewals: Arc<RenewalService>,
    pub time_entries: Arc<TimeEntryService>,
    pub tickets: Arc<TicketService>,
    pub outreach: Arc<OutreachService>,
    pub campaigns: Arc<CampaignService>,
    pub tracking: Arc<TrackingService>,
    pub payments: Arc<PaymentWebhookService>,
}

impl AppState {
    /// 组装仓库与领域服务
    pub fn new(db: Arc<DatabaseConnection>, settings: Arc<Settings>, providers: Providers) -> Self {
        let sequences = Arc::new(SequenceRepoImpl::new(db.clone()));
        let users = Arc::new(UserRepoImpl::new(db.clone()));
        let outreach_repo = Arc::new(OutreachRepoImpl::new(db.clone()));

        let crm = Arc::new(CrmService::new(Arc::new(CrmRepoImpl::new(db.clone()))));
        let catalog = Arc::new(CatalogService::new(Arc::new(CatalogRepoImpl::new(db.clone()))));
        let ledger = Arc::new(LedgerService::new(
            Arc::new(LedgerRepoImpl::new(db.clone())),
            settings.ledger.auto_create_periods,
        ));

        let mailer = Mailer::new(
            providers.email,
            settings.email.from_address.clone(),
            Some(settings.email.from_name.clone()),
        );
        let signer = TokenSigner::new(&settings.email.tracking_secret);

        let invoices = Arc::new(
            InvoiceService::new(
                Arc::new(InvoiceRepoImpl::new(db.clone())),
                sequences.clone(),
                catalog.clone(),
                ledger.clone(),
                crm.clone(),
            )
            .with_mailer(mailer.clone()),
        );
        let quotes = Arc::new(QuoteService::new(
            Arc::new(QuoteRepoImpl::new(db.clone())),
            sequences.clone(),
            catalog.clone(),
            crm.clone(),
            invoices.clone(),
        ));
        let renewals = Arc::new(RenewalService::new(
            Arc::new(RenewalRepoImpl::new(db.clone())),
            invoices.clone(),
            ledger.clone(),
            crm.clone(),
        ));
        let time_entries = Arc::new(TimeEntryService::new(
            Arc::new(TimeEntryRepoImpl::new(db.clone())),
            ledger.clone(),
            crm.clone(),
        ));
        let tickets = Arc::new(TicketService::new(
            Arc::new(TicketRepoImpl::new(db.clone())),
            sequences,
            users.clone(),
            crm.clone(),
        ));

        let delivery = Arc::new(DeliveryService::new(
            outreach_repo.clone(),
            mailer,
            providers.sms,
            signer.clone(),
            &settings.server.public_base_url,
        ));
        let outreach = Arc::new(
            OutreachService::new(outreach_repo.clone(), crm.clone(), delivery.clone())
                .with_retry_delay(settings.outreach.retry_delay_secs),
        );
        let campaigns = Arc::new(CampaignService::new(
            outreach_repo.clone(),
            crm.clone(),
            delivery,
        ));
        let tracking = Arc::new(TrackingService::new(outreach_repo, signer));

        let payments = Arc::new(PaymentWebhookService::new(
            Arc::new(PaymentEventRepoImpl::new(db.clone())),
            invoices.clone(),
            settings.stripe.webhook_secret.clone(),
            settings.stripe.tolerance_secs,
            providers.paypal,
        ));

        let auth = Arc::new(AuthService::new(
            Arc::new(TenantRepoImpl::new(db.clone())),
            users,
            Arc::new(PortalUserRepoImpl::new(db)),
            ledger.clone(),
            crm.clone(),
            AuthPolicy::from(&settings.auth),
        ));

        Self {
            settings,
            auth,
            crm,
            catalog,
            quotes,
            invoices,
            ledger,
            renewals,
            time_entries,
            tickets,
            outreach,
            campaigns,
            tracking,
            payments,
        }
    }
}

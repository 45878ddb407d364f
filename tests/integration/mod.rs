// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod auth_test;
pub mod billing_test;
pub mod helpers;
pub mod ledger_test;
pub mod outreach_test;
pub mod payment_webhook_test;
pub mod portal_test;
pub mod providers_test;
pub mod renewals_test;

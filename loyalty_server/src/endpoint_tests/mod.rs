mod auth;
mod helpers;
mod ledger;
mod orders;

/*!
# Notaris & PPAT Back Office

A small back-office server for an Indonesian notary (Notaris) who is also a
land deed official (PPAT), built in Rust.

## Overview

The office keeps its working records in flat JSON files: customer due
diligence forms, a legal-entity document archive, invoices and printed
cover sheets, a billing list of client jobs, job progress tracking, a petty
cash ledger, staff attendance, the register of deeds used for the monthly
statutory reports, an office chat, saved tax estimates, a bank of deed
drafts, client portal accounts, message templates and incorporation
questionnaires. Every record
type lives in its own file under the data directory and is read and
rewritten whole on each change.

## Architecture

### HTTP Layer
- **Technologies**: axum, tower-http
- JSON actions answer `{ "success": bool, ... }`; failures are logged and
  reported with a message instead of an error status
- Print views render A4 HTML pages through handlebars templates
- Uploaded files are served from `<public>/uploads`

### Domain Layer
- **store**: whole-file JSON persistence, id generation, atomic writes
- **upload**: sanitized, timestamped file uploads per module
- **timeline**: lane packing for the job tracking chart
- **report**: deed register, monthly report summaries, letters and annexes
- **attendance**: pay periods, attendance status and meal allowance
- **petty_cash**: ledger, balance, limits and XLSX export
- **dashboard**: month-over-month figures across the modules

### Data Persistence Layer
- Pretty-printed JSON arrays (2-space indent, camelCase keys)
- Single-object documents for settings and the chat sticky note
- XLSX exports built in memory with rust_xlsxwriter

## Modules

- **config**: runtime settings from file, environment and command line
- **error**: the error type shared by every module
- **format**: rupiah amounts, Indonesian dates, Roman numerals, number words
- **cdd**: customer due diligence forms (individual and corporate)
- **legalitas**: legal entity document archive
- **forms**: invoices and archived print forms
- **history**: every archived document in one list
- **kwitansi**: printed payment receipts
- **drafts**: bank of deed drafts
- **accounts**: client accounts on government portals
- **wa_forms**: WhatsApp message templates
- **webform**: incorporation questionnaires
- **jobs**: job billing list with payment instalments
- **tracking**: job progress tracking with history
- **chat**: office chat and sticky note
- **tax**: BPHTB / PPh / PNBP estimate
- **office**: all stores of one office
- **app**: routing and handlers (feature `web`)
*/

pub mod accounts;
pub mod attendance;
pub mod cdd;
pub mod chat;
pub mod config;
pub mod dashboard;
pub mod drafts;
pub mod error;
pub mod format;
pub mod forms;
pub mod history;
pub mod jobs;
pub mod kwitansi;
pub mod legalitas;
pub mod office;
pub mod petty_cash;
pub mod report;
pub mod store;
pub mod tax;
pub mod timeline;
pub mod tracking;
pub mod upload;
pub mod wa_forms;
pub mod webform;

#[cfg(feature = "web")]
pub mod app;

pub use error::{AppError, Result};
pub use office::Office;

/*!
# Report Console

A web console for a building-management reporting service, built in Rust.

## Overview

Operators log in, maintain report templates (named sets of sensor
parameters plus the statistics to compute over them), generate or schedule
reports from those templates, and review or approve the generated reports.
All data lives in a remote reporting REST API; the console keeps only the
user session.

## Parameter tokens

A template stores each parameter as one flat string:

- `Temperature` - bare name
- `Power_Unit_kW` - name with a unit label
- `Temp_From_10_To_50_Unit_C` - name with an integer acceptance range and unit

The [`parameter`] module decodes, encodes and validates these tokens and is
the part every other module builds on.

## Architecture

### Domain layer (always built)
- **parameter**: token codec, range validation, editable drafts
- **template**: template records, statistics, search and sort
- **editor**: edit and create forms with their validation rules
- **report**: report records, status labels, review/approve permissions
- **export**: manual export and schedule requests
- **session**: user session and session stores
- **saving**: gzip + bincode persistence of a session
- **config**: environment and command line settings

### Web layer (feature `web`)
- **backend**: `reqwest` client for the reporting REST API
- **app**: `axum` routes, cookie sessions and auth middleware

## REST API Endpoints

- `POST /login`, `POST /logout`, `GET /api/session`
- `GET|POST /api/templates`, `PUT /api/templates/{id}`, `POST /api/templates/delete`
- `GET /api/parameters`, `GET|POST /api/groups`, `GET /api/users`, `GET /api/schedules`
- `GET /api/reports/{kind}`, `GET /api/reports/{kind}/{id}`,
  `POST /api/reports/{kind}/{id}/{action}`
- `POST /api/export`
*/

pub mod config;
pub mod editor;
pub mod export;
pub mod parameter;
pub mod report;
pub mod saving;
pub mod session;
pub mod template;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod backend;

pub use config::ConsoleConfig;
pub use parameter::{Parameter, ParameterDraft, ParameterError};
pub use session::{SessionStore, UserSession};
pub use template::{Statistic, Template, TemplatePayload};

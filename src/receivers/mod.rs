// SPDX-License-Identifier: Apache-2.0

pub mod logfile;
pub mod output;

use opentelemetry::global;
use opentelemetry::metrics::Meter;

pub fn get_meter() -> Meter {
    global::meter("receivers")
}

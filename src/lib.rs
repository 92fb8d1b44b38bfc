// SPDX-License-Identifier: Apache-2.0

pub mod filter;
pub mod logger_tree;
pub mod model;
pub mod receivers;

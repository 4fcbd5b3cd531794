// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain layer: provider interface, configuration schema and events.
//! No network I/O lives here.

pub mod config;
pub mod events;
pub mod llm;

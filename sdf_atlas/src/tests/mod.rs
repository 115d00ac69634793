// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod test_export;
mod test_pipeline;
mod utils;

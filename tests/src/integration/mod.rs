//! # Integration Tests
//!
//! | Module | Covers |
//! |--------|--------|
//! | `scenario` | Batch creation through verification, sale and recall |
//! | `concurrency` | Parallel appends, sales and batch numbering |
//! | `atomicity` | Failed operations leave no rows, file store included |
//! | `tamper` | Chain verification against mutated storage |
//! | `http` | The node's gateway over the full stack |

pub mod atomicity;
pub mod concurrency;
pub mod http;
pub mod scenario;
pub mod tamper;

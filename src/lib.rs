//! Simulation harness for N-dimensional Minesweeper solvers.
//!
//! Classifies board shapes (planar, dice cube, generic cube, hypercube),
//! projects boards into renderable views, drives an external solving engine
//! through single steps, full games, batches and algorithm comparisons, and
//! reduces the results to statistics and CSV.
//!
//! The engine itself lives behind [`engine::Engine`]; on `wasm32` a
//! JavaScript engine class can be plugged in and the whole harness is
//! exported via wasm-bindgen.

pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod projection;
pub mod report;
pub mod rng;
pub mod session;
pub mod stats;
pub mod time;
pub mod topology;
pub mod types;

#[cfg(target_arch = "wasm32")]
pub mod js_engine;

#[cfg(test)]
mod testing;

pub use config::{BenchmarkPlan, BoardConfig, HarnessConfig};
pub use engine::{Engine, Simulator};
pub use error::{ConfigError, EngineError, ExportError, SimError};
pub use orchestrator::{BatchOutcome, BatchRun, CancelToken, ComparisonOutcome, Orchestrator, Phase};
pub use projection::{project, BoardView, ProjectedView, ViewState};
pub use report::{to_benchmark_csv, to_csv};
pub use stats::{summarize, GameStats};
pub use topology::{classify, ClassifiedBoard, Topology};
pub use types::{AlgorithmId, Board, BoardSnapshot, Cell, GameRecord, TspObjective};

// ─── WASM Exports (only compiled for wasm32 target) ─────────────────────────

#[cfg(target_arch = "wasm32")]
mod wasm_exports {
    use serde::Serialize;
    use wasm_bindgen::prelude::*;

    use crate::config::{presets, BenchmarkPlan, BoardConfig, HarnessConfig};
    use crate::js_engine::JsEngine;
    use crate::orchestrator::{BatchOutcome, BatchRun, CancelToken, ComparisonOutcome, Orchestrator};
    use crate::projection::{project, BoardView, ViewState};
    use crate::topology::{classify, ClassifiedBoard};
    use crate::types::{AlgorithmId, Board, BoardSnapshot, GameRecord};
    use crate::{report, stats};

    fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(value).map_err(|e| JsError::new(&e.to_string()))
    }

    fn from_js<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsError> {
        serde_wasm_bindgen::from_value(value).map_err(|e| JsError::new(&e.to_string()))
    }

    fn err(e: impl std::fmt::Display) -> JsError {
        JsError::new(&e.to_string())
    }

    fn optional<T: serde::de::DeserializeOwned + Default>(value: JsValue) -> Result<T, JsError> {
        if value.is_undefined() || value.is_null() {
            Ok(T::default())
        } else {
            from_js(value)
        }
    }

    fn parse_algorithms(names: &[String]) -> Result<Vec<AlgorithmId>, JsError> {
        names
            .iter()
            .map(|name| name.parse::<AlgorithmId>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| JsError::new(&e))
    }

    /// Classify a dimension vector. Returns `{ kind, ... }`.
    #[wasm_bindgen(js_name = "classify")]
    pub fn wasm_classify(dims: Vec<usize>) -> Result<JsValue, JsError> {
        to_js(&classify(&dims).map_err(err)?)
    }

    /// Project a raw engine snapshot. Malformed snapshots give `{ state: "NoBoard" }`.
    #[wasm_bindgen(js_name = "project")]
    pub fn wasm_project(snapshot: JsValue, view: JsValue) -> Result<JsValue, JsError> {
        let view: ViewState = optional(view)?;
        let snapshot: BoardSnapshot = from_js(snapshot)?;
        let board = Board::try_from(snapshot).and_then(ClassifiedBoard::new);
        let out = match board {
            Ok(board) => BoardView::Ready(project(&board, &view).map_err(err)?),
            Err(e) => BoardView::NoBoard { reason: e.to_string() },
        };
        to_js(&out)
    }

    #[wasm_bindgen(js_name = "summarizeByAlgorithm")]
    pub fn wasm_summarize_by_algorithm(records: JsValue) -> Result<JsValue, JsError> {
        let records: Vec<GameRecord> = from_js(records)?;
        to_js(&stats::summarize_by_algorithm(&records))
    }

    #[wasm_bindgen(js_name = "toBenchmarkCsv")]
    pub fn wasm_to_benchmark_csv(records: JsValue) -> Result<String, JsError> {
        let records: Vec<GameRecord> = from_js(records)?;
        report::to_benchmark_csv(&records).map_err(err)
    }

    #[wasm_bindgen(js_name = "summarize")]
    pub fn wasm_summarize(records: JsValue, label: &str) -> Result<JsValue, JsError> {
        let records: Vec<GameRecord> = from_js(records)?;
        to_js(&stats::summarize(&records, label))
    }

    #[wasm_bindgen(js_name = "toCsv")]
    pub fn wasm_to_csv(records: JsValue) -> Result<String, JsError> {
        let records: Vec<GameRecord> = from_js(records)?;
        report::to_csv(&records).map_err(err)
    }

    #[wasm_bindgen(js_name = "presets")]
    pub fn wasm_presets() -> Result<JsValue, JsError> {
        to_js(&presets())
    }

    /// Harness bound to a JS engine class.
    #[wasm_bindgen(js_name = "Harness")]
    pub struct WasmHarness {
        inner: Orchestrator<JsEngine>,
    }

    #[wasm_bindgen(js_class = "Harness")]
    impl WasmHarness {
        /// `config` is an optional partial harness config.
        #[wasm_bindgen(constructor)]
        pub fn new(config: JsValue) -> Result<WasmHarness, JsError> {
            let harness: HarnessConfig = optional(config)?;
            harness.validate().map_err(err)?;
            Ok(Self {
                inner: Orchestrator::new(harness),
            })
        }

        /// Install the engine's `Simulator` class. Returns whether it offers `new2D`.
        #[wasm_bindgen(js_name = "loadEngine")]
        pub fn load_engine(&mut self, class: JsValue) -> Result<bool, JsError> {
            let engine = JsEngine::inspect(class).map_err(err)?;
            let has_new_2d = engine.has_new_2d();
            self.inner.load_engine(engine);
            Ok(has_new_2d)
        }

        #[wasm_bindgen(js_name = "createBoard")]
        pub fn create_board(&mut self, config: JsValue) -> Result<JsValue, JsError> {
            let config: BoardConfig = from_js(config)?;
            let board = self.inner.create_board(&config).map_err(err)?;
            to_js(&board.board)
        }

        pub fn step(&mut self) -> Result<JsValue, JsError> {
            let board = self.inner.step().map_err(err)?;
            to_js(&board.board)
        }

        #[wasm_bindgen(js_name = "runToCompletion")]
        pub fn run_to_completion(&mut self) -> Result<JsValue, JsError> {
            let board = self.inner.run_to_completion().map_err(err)?;
            to_js(&board.board)
        }

        pub fn reset(&mut self) -> Result<JsValue, JsError> {
            let board = self.inner.reset().map_err(err)?;
            to_js(&board.board)
        }

        #[wasm_bindgen(js_name = "setAlgorithm")]
        pub fn set_algorithm(&mut self, algorithm: &str) -> Result<JsValue, JsError> {
            let algorithm: AlgorithmId = algorithm.parse().map_err(|e: String| JsError::new(&e))?;
            let board = self.inner.set_algorithm(algorithm).map_err(err)?;
            to_js(&board.board)
        }

        pub fn view(&self, view: JsValue) -> Result<JsValue, JsError> {
            let view: ViewState = optional(view)?;
            to_js(&self.inner.view(&view).map_err(err)?)
        }

        /// Start a batch played one `next()` at a time. `games` defaults to
        /// the harness `batch_size`.
        #[wasm_bindgen(js_name = "startBatch")]
        pub fn start_batch(&mut self, games: Option<usize>, config: JsValue) -> Result<WasmBatchRun, JsError> {
            let config: BoardConfig = from_js(config)?;
            let games = games.unwrap_or(self.inner.harness().batch_size);
            let run = self.inner.batch(games, &config, &CancelToken::new()).map_err(err)?;
            Ok(WasmBatchRun::new(run.detach()))
        }

        /// Start a comparison. `games` defaults to the harness
        /// `games_per_algorithm`.
        #[wasm_bindgen(js_name = "startCompare")]
        pub fn start_compare(
            &mut self,
            algorithms: Vec<String>,
            games: Option<usize>,
            config: JsValue,
        ) -> Result<WasmBatchRun, JsError> {
            let algorithms = parse_algorithms(&algorithms)?;
            let config: BoardConfig = from_js(config)?;
            let games = games.unwrap_or(self.inner.harness().games_per_algorithm);
            let run = self
                .inner
                .comparison(&algorithms, games, &config, &CancelToken::new())
                .map_err(err)?;
            Ok(WasmBatchRun::new(run.detach()))
        }

        /// Start the benchmark matrix. `plan` is an optional partial plan.
        #[wasm_bindgen(js_name = "startBenchmark")]
        pub fn start_benchmark(&mut self, plan: JsValue) -> Result<WasmBatchRun, JsError> {
            let plan: BenchmarkPlan = optional(plan)?;
            let run = self.inner.benchmark(&plan, &CancelToken::new()).map_err(err)?;
            Ok(WasmBatchRun::new(run.detach()))
        }

        /// Blocking batch; prefer `startBatch` for long runs.
        #[wasm_bindgen(js_name = "runBatch")]
        pub fn run_batch(&mut self, games: Option<usize>, config: JsValue) -> Result<JsValue, JsError> {
            to_js(&self.start_batch(games, config)?.drain())
        }

        /// Blocking comparison; prefer `startCompare` for long runs.
        #[wasm_bindgen(js_name = "compareAlgorithms")]
        pub fn compare_algorithms(
            &mut self,
            algorithms: Vec<String>,
            games: Option<usize>,
            config: JsValue,
        ) -> Result<JsValue, JsError> {
            let outcome = self.start_compare(algorithms, games, config)?.drain();
            to_js(&ComparisonOutcome::from(outcome))
        }

        /// Recent status lines, oldest first.
        pub fn status(&self) -> Result<JsValue, JsError> {
            let entries: Vec<_> = self.inner.status().iter().collect();
            to_js(&entries)
        }
    }

    /// Batch, comparison or benchmark in progress.
    ///
    /// Pull games with `next()` or `nextChunk(k)` between animation frames;
    /// `cancel()` stops before the next game, `finish()` plays out the rest.
    #[wasm_bindgen(js_name = "BatchRun")]
    pub struct WasmBatchRun {
        run: Option<BatchRun<JsEngine>>,
        played: Vec<GameRecord>,
        faults: Vec<String>,
        cancelled: bool,
    }

    impl WasmBatchRun {
        fn new(run: BatchRun<JsEngine>) -> Self {
            Self {
                run: Some(run),
                played: Vec::new(),
                faults: Vec::new(),
                cancelled: false,
            }
        }

        fn pull(&mut self, k: usize) -> Vec<GameRecord> {
            let chunk = match self.run.as_mut() {
                Some(run) => run.next_chunk(k),
                None => Vec::new(),
            };
            self.played.extend(chunk.iter().cloned());
            chunk
        }

        /// Everything played so far plus the rest of the run.
        fn drain(&mut self) -> BatchOutcome {
            if let Some(run) = self.run.take() {
                let rest = run.finish();
                self.played.extend(rest.records);
                self.faults.extend(rest.faults);
                self.cancelled |= rest.cancelled;
            }
            BatchOutcome {
                records: std::mem::take(&mut self.played),
                faults: std::mem::take(&mut self.faults),
                cancelled: self.cancelled,
            }
        }
    }

    #[wasm_bindgen(js_class = "BatchRun")]
    impl WasmBatchRun {
        /// Next game record, or `undefined` when done or cancelled.
        pub fn next(&mut self) -> Result<JsValue, JsError> {
            match self.pull(1).pop() {
                Some(record) => to_js(&record),
                None => Ok(JsValue::UNDEFINED),
            }
        }

        /// Up to `k` more records; an empty array means the run is over.
        #[wasm_bindgen(js_name = "nextChunk")]
        pub fn next_chunk(&mut self, k: usize) -> Result<JsValue, JsError> {
            to_js(&self.pull(k))
        }

        pub fn cancel(&mut self) {
            if let Some(run) = &self.run {
                run.cancel_token().cancel();
            }
        }

        pub fn remaining(&self) -> usize {
            self.run.as_ref().map_or(0, BatchRun::remaining)
        }

        /// `{ records, faults, cancelled }` for the whole run.
        pub fn finish(&mut self) -> Result<JsValue, JsError> {
            to_js(&self.drain())
        }
    }

    /// Ping function to verify WASM is loaded.
    #[wasm_bindgen(js_name = "ping")]
    pub fn wasm_ping() -> String {
        "WASM harness ready".to_string()
    }
}

//! [`Engine`] over a JavaScript `Simulator` class.
//!
//! The class is expected to look like the engine's wasm-bindgen export:
//! `new Simulator(dims, mines, algorithm)`, optionally `Simulator.new2D(w, h,
//! mines, algorithm)`, and instance methods `getState`, `run_step`,
//! `runFullGame`, `reset`, `setAlgorithm`, plus the optional `setTspObjective`
//! and `setSeed`. Algorithms and objectives cross the boundary as the engine's
//! enum discriminants ([`AlgorithmId::engine_code`]).

use js_sys::{Array, Function, Reflect};
use wasm_bindgen::{JsCast, JsValue};

use crate::engine::{Engine, Simulator};
use crate::error::EngineError;
use crate::rng::seed_to_f64;
use crate::types::{AlgorithmId, BoardSnapshot, TspObjective};

fn js_error(e: JsValue) -> EngineError {
    EngineError::new(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

fn lookup(target: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
}

fn method(target: &JsValue, name: &str) -> Result<Function, EngineError> {
    lookup(target, name).ok_or_else(|| EngineError::new(format!("engine has no `{name}` method")))
}

fn num(n: usize) -> JsValue {
    JsValue::from(n as u32)
}

fn algorithm_code(algorithm: AlgorithmId) -> Result<JsValue, EngineError> {
    algorithm
        .engine_code()
        .map(JsValue::from)
        .ok_or_else(|| EngineError::new(format!("`{algorithm}` has no engine code")))
}

/// Engine factory backed by a JS class.
#[derive(Clone)]
pub struct JsEngine {
    class: Function,
    new_2d: Option<Function>,
}

impl JsEngine {
    /// Inspect `class` once and remember which constructors it offers.
    pub fn inspect(class: JsValue) -> Result<Self, EngineError> {
        let class: Function = class
            .dyn_into()
            .map_err(|_| EngineError::new("engine export is not a constructor"))?;
        let new_2d = lookup(&class, "new2D");
        tracing::info!(new_2d = new_2d.is_some(), "JS engine inspected");
        Ok(Self { class, new_2d })
    }

    pub fn has_new_2d(&self) -> bool {
        self.new_2d.is_some()
    }
}

impl Engine for JsEngine {
    type Simulator = JsSimulator;

    fn create(&self, dimensions: &[usize], mines: usize, algorithm: AlgorithmId) -> Result<JsSimulator, EngineError> {
        let code = algorithm_code(algorithm)?;
        let inner = match (&self.new_2d, dimensions) {
            (Some(new_2d), &[height, width]) => {
                let args = Array::new();
                args.push(&num(width));
                args.push(&num(height));
                args.push(&num(mines));
                args.push(&code);
                new_2d.apply(&self.class, &args).map_err(js_error)?
            }
            _ => {
                let dims: Array = dimensions.iter().map(|&d| num(d)).collect();
                let args = Array::new();
                args.push(&dims);
                args.push(&num(mines));
                args.push(&code);
                Reflect::construct(&self.class, &args).map_err(js_error)?
            }
        };
        Ok(JsSimulator { inner, algorithm })
    }
}

/// One JS simulator instance.
pub struct JsSimulator {
    inner: JsValue,
    algorithm: AlgorithmId,
}

impl JsSimulator {
    fn call0(&self, name: &str) -> Result<JsValue, EngineError> {
        method(&self.inner, name)?.call0(&self.inner).map_err(js_error)
    }

    fn decode(&self, value: JsValue) -> Result<BoardSnapshot, EngineError> {
        let mut snapshot: BoardSnapshot =
            serde_wasm_bindgen::from_value(value).map_err(|e| EngineError::new(format!("bad snapshot: {e}")))?;
        // engines that do not echo the solver id still run the one we bound
        snapshot.algorithm.get_or_insert(self.algorithm);
        Ok(snapshot)
    }
}

impl Simulator for JsSimulator {
    fn state(&self) -> Result<BoardSnapshot, EngineError> {
        let value = self.call0("getState")?;
        self.decode(value)
    }

    fn step(&mut self) -> Result<BoardSnapshot, EngineError> {
        self.call0("run_step")?;
        self.state()
    }

    fn run_full_game(&mut self) -> Result<BoardSnapshot, EngineError> {
        let value = self.call0("runFullGame")?;
        self.decode(value)
    }

    fn set_algorithm(&mut self, algorithm: AlgorithmId) -> Result<(), EngineError> {
        method(&self.inner, "setAlgorithm")?
            .call1(&self.inner, &algorithm_code(algorithm)?)
            .map_err(js_error)?;
        self.algorithm = algorithm;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        self.call0("reset").map(drop)
    }

    fn set_seed(&mut self, seed: u64) {
        if let Some(f) = lookup(&self.inner, "setSeed") {
            if let Err(e) = f.call1(&self.inner, &JsValue::from_f64(seed_to_f64(seed))) {
                tracing::warn!(error = ?e, "setSeed failed");
            }
        }
    }

    fn set_objective(&mut self, objective: TspObjective) {
        if let Some(f) = lookup(&self.inner, "setTspObjective") {
            if let Err(e) = f.call1(&self.inner, &JsValue::from(objective.engine_code())) {
                tracing::warn!(error = ?e, "setTspObjective failed");
            }
        }
    }
}

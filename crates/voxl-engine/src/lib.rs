//! Module linking and kernel execution engine for Voxl.
//!
//! The engine is the compiler's code-generation backend, with the small
//! surface the rest of the system depends on: build ([`Engine::add_module`]
//! verifies and links a module against the host's native helper table)
//! and resolve ([`LinkedModule::kernel`] returns a callable entry
//! point). Kernels execute against a per-element [`KernelContext`]
//! supplied by the executable layer.
//!
//! Linked modules and the function registry are immutable during
//! execution; workers share them behind `Arc` and keep their own
//! [`KernelState`].

pub mod context;
pub mod engine;
pub mod error;
pub mod exec;

pub use context::{KernelContext, NativeFn, SymbolResolver};
pub use engine::{Engine, LinkedModule};
pub use error::{ExecError, JitError};
pub use exec::{Kernel, KernelState};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use voxl_ast::parse;
    use voxl_codegen::{
        resolve_types, AttributeRegistry, TypingOptions, VolumeGenerator, VOLUME_ENTRY,
    };
    use voxl_registry::FunctionRegistry;
    use voxl_types::{Scalar, Value};

    struct MockContext {
        attrs: Vec<Value>,
    }

    impl KernelContext for MockContext {
        fn coord(&self) -> [i32; 3] {
            [0, 0, 0]
        }
        fn element_id(&self) -> u64 {
            0
        }
        fn attr_load(&mut self, index: usize) -> Value {
            self.attrs[index].clone()
        }
        fn attr_store(&mut self, index: usize, value: Value) {
            self.attrs[index] = value;
        }
        fn index_to_world(&self, index: [f64; 3]) -> [f64; 3] {
            index
        }
        fn world_to_index(&self, world: [f64; 3]) -> [i32; 3] {
            [world[0] as i32, world[1] as i32, world[2] as i32]
        }
        fn custom(&self, _name: &str) -> Option<Value> {
            None
        }
    }

    fn run(src: &str, attrs: Vec<Value>) -> Result<Vec<Value>, ExecError> {
        let tree = parse(src).unwrap();
        let attr_registry = AttributeRegistry::scan(&tree).unwrap();
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let resolution =
            resolve_types(&tree, &attr_registry, &registry, &TypingOptions::default()).unwrap();
        let module =
            VolumeGenerator::generate(&tree, &attr_registry, &registry, &resolution).unwrap();

        let engine = Engine::new(registry);
        let linked = engine.add_module(module, &|_| None).unwrap();
        let kernel = linked.kernel(VOLUME_ENTRY).unwrap();
        let mut state = kernel.state();
        let mut ctx = MockContext { attrs };
        kernel.invoke(&mut state, &mut ctx)?;
        Ok(ctx.attrs)
    }

    #[test]
    fn arithmetic_kernel_runs() {
        let out = run(
            "@density = @density + 1.0f;",
            vec![Value::Scalar(Scalar::F32(2.0))],
        )
        .unwrap();
        assert_eq!(out[0], Value::Scalar(Scalar::F32(3.0)));
    }

    #[test]
    fn loops_terminate() {
        let out = run(
            "int n = 0; while (n < 5) n += 1; i@out = n;",
            vec![Value::Scalar(Scalar::I32(0))],
        )
        .unwrap();
        assert_eq!(out[0], Value::Scalar(Scalar::I32(5)));
    }

    #[test]
    fn for_loop_with_break() {
        let out = run(
            "int n = 0; for (int i = 0; i < 100; ++i) { if (i == 3) break; n += 2; } i@out = n;",
            vec![Value::Scalar(Scalar::I32(0))],
        )
        .unwrap();
        assert_eq!(out[0], Value::Scalar(Scalar::I32(6)));
    }

    #[test]
    fn division_by_zero_traps() {
        let err = run("i@a = 1 / i@a;", vec![Value::Scalar(Scalar::I32(0))]).unwrap_err();
        assert_eq!(err, ExecError::DivideByZero);
    }

    #[test]
    fn short_circuit_result() {
        let out = run(
            "i@hits = 0; if (@a > 0.0f || @a < -100.0f) i@hits = 1;",
            vec![
                Value::Scalar(Scalar::I32(0)),
                Value::Scalar(Scalar::F32(1.0)),
            ],
        )
        .unwrap();
        assert_eq!(out[0], Value::Scalar(Scalar::I32(1)));
    }

    #[test]
    fn vector_arithmetic() {
        let start = Value::Array(voxl_types::ArrayValue::new(
            voxl_types::ScalarType::F32,
            vec![Scalar::F32(1.0), Scalar::F32(2.0), Scalar::F32(3.0)],
        ));
        let out = run("v@P += {0.0f, 1.0f, 0.0f};", vec![start]).unwrap();
        let array = out[0].as_array().unwrap();
        assert_eq!(array.get(0), Scalar::F32(1.0));
        assert_eq!(array.get(1), Scalar::F32(3.0));
        assert_eq!(array.get(2), Scalar::F32(3.0));
    }

    #[test]
    fn locals_reset_between_invocations() {
        let tree = parse("int n; n += 1; i@out = n;").unwrap();
        let attr_registry = AttributeRegistry::scan(&tree).unwrap();
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let resolution =
            resolve_types(&tree, &attr_registry, &registry, &TypingOptions::default()).unwrap();
        let module =
            VolumeGenerator::generate(&tree, &attr_registry, &registry, &resolution).unwrap();
        let engine = Engine::new(registry);
        let linked = engine.add_module(module, &|_| None).unwrap();
        let kernel = linked.kernel(VOLUME_ENTRY).unwrap();
        let mut state = kernel.state();
        let mut ctx = MockContext {
            attrs: vec![Value::Scalar(Scalar::I32(0))],
        };
        kernel.invoke(&mut state, &mut ctx).unwrap();
        kernel.invoke(&mut state, &mut ctx).unwrap();
        // n starts at zero both times.
        assert_eq!(ctx.attrs[0], Value::Scalar(Scalar::I32(1)));
    }

    #[test]
    fn unresolved_external_fails_to_link() {
        let tree = parse("i@x = getcoordx();").unwrap();
        let attr_registry = AttributeRegistry::scan(&tree).unwrap();
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let resolution =
            resolve_types(&tree, &attr_registry, &registry, &TypingOptions::default()).unwrap();
        let module =
            VolumeGenerator::generate(&tree, &attr_registry, &registry, &resolution).unwrap();
        let engine = Engine::new(registry);
        let err = engine.add_module(module, &|_| None).unwrap_err();
        assert!(matches!(err, JitError::UnresolvedSymbol { .. }));
    }

    #[test]
    fn externals_dispatch_through_context() {
        let tree = parse("i@x = getcoordx();").unwrap();
        let attr_registry = AttributeRegistry::scan(&tree).unwrap();
        let registry = Arc::new(FunctionRegistry::with_builtins());
        let resolution =
            resolve_types(&tree, &attr_registry, &registry, &TypingOptions::default()).unwrap();
        let module =
            VolumeGenerator::generate(&tree, &attr_registry, &registry, &resolution).unwrap();
        let engine = Engine::new(registry);
        fn coord_x(ctx: &mut dyn KernelContext, _args: &[Value]) -> Option<Value> {
            Some(Value::Scalar(Scalar::I32(ctx.coord()[0])))
        }
        let linked = engine
            .add_module(module, &|symbol| {
                (symbol == voxl_registry::symbols::COORD_X).then_some(coord_x as NativeFn)
            })
            .unwrap();
        let kernel = linked.kernel(VOLUME_ENTRY).unwrap();
        let mut state = kernel.state();
        let mut ctx = MockContext {
            attrs: vec![Value::Scalar(Scalar::I32(0))],
        };
        kernel.invoke(&mut state, &mut ctx).unwrap();
        assert_eq!(ctx.attrs[0], Value::Scalar(Scalar::I32(0)));
    }
}

//! Compiler driver for the Voxl kernel language.
//!
//! [`Compiler::compile_volume`] and [`Compiler::compile_points`] run the
//! whole pipeline: parse, attribute scan, type resolution, target
//! lowering, optimisation, verification and linking - and hand back an
//! executable bound to its attribute registry and custom data. Failures
//! surface as structured [`Diagnostics`] with line/column locations;
//! warnings ride along with successful compiles (or become errors under
//! `warn_as_error`).
//!
//! ```no_run
//! use voxl_compiler::{Compiler, CompilerOptions};
//! use voxl_runtime::VolumeGrid;
//!
//! let compiler = Compiler::new();
//! let output = compiler
//!     .compile_volume("@density = @density * 2.0f;", &CompilerOptions::default())
//!     .expect("kernel compiles");
//! let mut grids: Vec<VolumeGrid> = Vec::new();
//! output.executable.execute(&mut grids).expect("kernel runs");
//! ```

pub mod diagnostics;

use std::sync::Arc;

use tracing::debug;

use voxl_codegen::{
    optimize, resolve_types, AttributeRegistry, Module, PointGenerator, Resolution,
    TypingOptions, VolumeGenerator,
};
use voxl_engine::Engine;
use voxl_registry::FunctionRegistry;
use voxl_runtime::{natives, CustomData, PointExecutable, VolumeExecutable};

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use voxl_codegen::OptLevel;

/// Which executable flavour to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// Per-voxel kernel over sparse volume grids.
    Volume,
    /// Per-point kernel over point grids.
    Point,
}

/// Options accepted by the driver.
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Optimisation level for the generated module.
    pub opt_level: OptLevel,
    /// Promote every warning to an error.
    pub warn_as_error: bool,
    /// Permit float-to-integer assignment with a narrowing warning.
    /// Defaults to true; when false such assignments are type errors.
    pub allow_implicit_float_to_int: bool,
    /// Key/value blob exposed to kernels through the `lookup*` builtins.
    pub custom_data: CustomData,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            opt_level: OptLevel::default(),
            warn_as_error: false,
            allow_implicit_float_to_int: true,
            custom_data: CustomData::default(),
        }
    }
}

impl CompilerOptions {
    fn typing(&self) -> TypingOptions {
        TypingOptions {
            allow_implicit_float_to_int: self.allow_implicit_float_to_int,
        }
    }
}

/// A successful compile: the executable plus any warnings.
#[derive(Debug)]
pub struct CompileOutput<T> {
    /// The compiled, linked executable.
    pub executable: T,
    /// Warnings in detection order.
    pub warnings: Vec<Diagnostic>,
}

/// Either executable flavour, for callers driving the target from data.
pub enum Executable {
    /// Volume kernel.
    Volume(VolumeExecutable),
    /// Point kernel.
    Point(PointExecutable),
}

/// The compiler: a shared function registry plus the execution engine.
pub struct Compiler {
    registry: Arc<FunctionRegistry>,
    engine: Engine,
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}

impl Compiler {
    /// A compiler over the built-in function catalogue.
    pub fn new() -> Compiler {
        Compiler::with_registry(Arc::new(FunctionRegistry::with_builtins()))
    }

    /// A compiler over a custom registry (tests register their own
    /// function groups this way).
    pub fn with_registry(registry: Arc<FunctionRegistry>) -> Compiler {
        let engine = Engine::new(registry.clone());
        Compiler { registry, engine }
    }

    /// The registry builtins resolve against.
    pub fn registry(&self) -> &Arc<FunctionRegistry> {
        &self.registry
    }

    /// Compile a volume kernel.
    ///
    /// # Errors
    ///
    /// Structured [`Diagnostics`]; `errors` is never empty on failure.
    pub fn compile_volume(
        &self,
        source: &str,
        options: &CompilerOptions,
    ) -> Result<CompileOutput<VolumeExecutable>, Diagnostics> {
        let (module, attrs, warnings) =
            self.front_end(source, options, TargetKind::Volume)?;
        let executable = VolumeExecutable::new(
            self.link(module)?,
            attrs,
            options.custom_data.clone(),
        );
        Ok(CompileOutput {
            executable,
            warnings,
        })
    }

    /// Compile a point kernel.
    ///
    /// # Errors
    ///
    /// Structured [`Diagnostics`]; `errors` is never empty on failure.
    pub fn compile_points(
        &self,
        source: &str,
        options: &CompilerOptions,
    ) -> Result<CompileOutput<PointExecutable>, Diagnostics> {
        let (module, attrs, warnings) = self.front_end(source, options, TargetKind::Point)?;
        let executable =
            PointExecutable::new(self.link(module)?, attrs, options.custom_data.clone());
        Ok(CompileOutput {
            executable,
            warnings,
        })
    }

    /// Compile for a target selected at run time.
    ///
    /// # Errors
    ///
    /// As for the typed entry points.
    pub fn compile(
        &self,
        source: &str,
        target: TargetKind,
        options: &CompilerOptions,
    ) -> Result<CompileOutput<Executable>, Diagnostics> {
        match target {
            TargetKind::Volume => self.compile_volume(source, options).map(|out| CompileOutput {
                executable: Executable::Volume(out.executable),
                warnings: out.warnings,
            }),
            TargetKind::Point => self.compile_points(source, options).map(|out| CompileOutput {
                executable: Executable::Point(out.executable),
                warnings: out.warnings,
            }),
        }
    }

    /// Parse, scan, resolve, lower and optimise.
    fn front_end(
        &self,
        source: &str,
        options: &CompilerOptions,
        target: TargetKind,
    ) -> Result<(Module, AttributeRegistry, Vec<Diagnostic>), Diagnostics> {
        let fail = |errors: Vec<Diagnostic>, warnings: Vec<Diagnostic>| Diagnostics {
            errors,
            warnings,
        };

        let tree = voxl_ast::parse(source)
            .map_err(|e| fail(vec![diagnostics::from_parse(e, source)], Vec::new()))?;
        debug!(nodes = tree.node_count, "parsed kernel");

        let attrs = AttributeRegistry::scan(&tree)
            .map_err(|e| fail(vec![diagnostics::from_codegen(e, source)], Vec::new()))?;

        let resolution: Resolution =
            resolve_types(&tree, &attrs, &self.registry, &options.typing())
                .map_err(|e| fail(vec![diagnostics::from_codegen(e, source)], Vec::new()))?;
        let warnings: Vec<Diagnostic> = resolution
            .warnings
            .iter()
            .map(|w| diagnostics::from_warning(w, source))
            .collect();
        if options.warn_as_error && !warnings.is_empty() {
            let errors = warnings
                .into_iter()
                .map(|mut d| {
                    d.severity = Severity::Error;
                    d
                })
                .collect();
            return Err(fail(errors, Vec::new()));
        }

        let mut module = match target {
            TargetKind::Volume => {
                VolumeGenerator::generate(&tree, &attrs, &self.registry, &resolution)
            }
            TargetKind::Point => {
                PointGenerator::generate(&tree, &attrs, &self.registry, &resolution)
            }
        }
        .map_err(|e| fail(vec![diagnostics::from_codegen(e, source)], warnings.clone()))?;

        optimize(&mut module, &self.registry, options.opt_level);
        Ok((module, attrs, warnings))
    }

    fn link(&self, module: Module) -> Result<Arc<voxl_engine::LinkedModule>, Diagnostics> {
        self.engine
            .add_module(module, &natives::resolver)
            .map(Arc::new)
            .map_err(|e| Diagnostics {
                errors: vec![diagnostics::from_jit(e)],
                warnings: Vec::new(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_surfaces_parse_errors_with_location() {
        let compiler = Compiler::new();
        let err = compiler
            .compile_volume("@a = ;", &CompilerOptions::default())
            .unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].kind, DiagnosticKind::Parse);
        assert_eq!(err.errors[0].line, 1);
        assert_eq!(err.errors[0].snippet, "@a = ;");
    }

    #[test]
    fn warnings_ride_along_on_success() {
        let compiler = Compiler::new();
        let out = compiler
            .compile_volume("i@a = i@a + 0.5;", &CompilerOptions::default())
            .unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].severity, Severity::Warning);
    }

    #[test]
    fn warn_as_error_promotes() {
        let compiler = Compiler::new();
        let options = CompilerOptions {
            warn_as_error: true,
            ..CompilerOptions::default()
        };
        let err = compiler.compile_volume("i@a = i@a + 0.5;", &options).unwrap_err();
        assert!(!err.errors.is_empty());
        assert!(err.errors.iter().all(|d| d.severity == Severity::Error));
    }

    #[test]
    fn implicit_float_to_int_can_be_disabled() {
        let compiler = Compiler::new();
        let options = CompilerOptions {
            allow_implicit_float_to_int: false,
            ..CompilerOptions::default()
        };
        let err = compiler.compile_volume("i@a = 0.5;", &options).unwrap_err();
        assert_eq!(err.errors[0].kind, DiagnosticKind::Type);
    }

    #[test]
    fn target_dispatch_compiles_both_flavours() {
        let compiler = Compiler::new();
        let options = CompilerOptions::default();
        assert!(matches!(
            compiler
                .compile("@a = 1.0f;", TargetKind::Volume, &options)
                .unwrap()
                .executable,
            Executable::Volume(_)
        ));
        assert!(matches!(
            compiler
                .compile("@a = 1.0f;", TargetKind::Point, &options)
                .unwrap()
                .executable,
            Executable::Point(_)
        ));
    }
}

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use formcheck::declarations::FormValues;
use formcheck::{
    Declarations, FieldValue, InputBinding, RuleCondition, ValidateOptions, Validator, report,
};
use serde_json::json;
use std::cell::RefCell;
use std::hint::black_box;
use std::rc::Rc;

/// Declarations for `fields` fields cycling through the built-in rules
fn generate_declarations(fields: usize) -> Declarations {
    let mut declarations = Declarations::new();
    for i in 0..fields {
        let cond = match i % 4 {
            0 => RuleCondition::new("required"),
            1 => RuleCondition::new("required, string")
                .option("string", json!({"minLength": 3, "maxLength": 32})),
            2 => RuleCondition::new("number").option("number", json!({"min": 0, "max": 100})),
            _ => RuleCondition::new("datetime")
                .option("datetime", json!({"min": "2000-01-01", "max": "2030-12-31"})),
        };
        declarations.set_condition("bench", &format!("field{}", i), cond);
    }
    declarations
}

/// Values for the generated fields; every `invalid_every`th one fails
fn generate_values(fields: usize, invalid_every: usize) -> FormValues {
    let mut values = FormValues::new();
    let form = values.entry("bench".to_string()).or_default();
    for i in 0..fields {
        let invalid = invalid_every > 0 && i % invalid_every == 0;
        let value = match (i % 4, invalid) {
            (0, false) => "present".to_string(),
            (1, false) => format!("name{}", i),
            (2, false) => (i % 100).to_string(),
            (3, false) => "2020-06-01".to_string(),
            (0, true) => String::new(),
            (1, true) => "ab".to_string(),
            (2, true) => "150".to_string(),
            _ => "1999-12-31".to_string(),
        };
        form.insert(format!("field{}", i), FieldValue::from(value));
    }
    values
}

/// Benchmark a full submit-style check with different error densities
fn bench_check_error_density(c: &mut Criterion) {
    let scenarios = vec![("all_valid", 0), ("quarter_invalid", 4), ("all_invalid", 1)];

    let mut group = c.benchmark_group("check_error_density");

    for (scenario, invalid_every) in scenarios {
        let values = generate_values(1_000, invalid_every);

        group.throughput(Throughput::Elements(1_000));
        group.bench_with_input(
            BenchmarkId::new("scenario", scenario),
            &values,
            |b, values| {
                b.iter(|| {
                    let result = report::check(generate_declarations(1_000), black_box(values));
                    black_box(result)
                })
            },
        );
    }

    group.finish();
}

/// Benchmark the sibling cascade triggered by a single changed field
fn bench_cascade(c: &mut Criterion) {
    let form_sizes = vec![10, 50, 100, 500];

    let mut group = c.benchmark_group("cascade");

    for &size in &form_sizes {
        let mut validator = Validator::new(generate_declarations(size));
        let values = generate_values(size, 0);
        let first = Rc::new(RefCell::new(InputBinding::new("field0")));
        validator.on_field_attached("bench", Rc::clone(&first));
        for (field, value) in values["bench"].iter().skip(1) {
            let binding = InputBinding::new(field).with_value(value.clone());
            validator.on_field_attached("bench", binding);
        }
        validator.validate_with("bench", None, &mut ValidateOptions::forced());

        let mut toggle = false;
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(BenchmarkId::new("fields", size), |b| {
            b.iter(|| {
                toggle = !toggle;
                first
                    .borrow_mut()
                    .set_value(if toggle { "on" } else { "off" });
                validator.validate("bench", Some("field0"));
                black_box(validator.has_errors(None, None))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_check_error_density, bench_cascade);
criterion_main!(benches);

use super::dispatch::{DispatchContext, decode_clauses, encode_op};
use super::naming::SymbolNames;
use super::plan::*;
use crate::config::{GeneratorOptions, GroupPolicy};
use crate::errors::GenError;
use crate::schema::{FieldKind, ResolvedEnum, ResolvedField, ResolvedMessage, ResolvedUnit};
use std::collections::HashMap;

const UNDEFINED_ATOM: &str = "undefined";

/* Tracks generated identifiers within one scope so two schema names never
 * land on the same Erlang name */
struct NameScope {
    scope: String,
    taken: HashMap<String, String>,
}

impl NameScope {
    fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            taken: HashMap::new(),
        }
    }

    fn claim(&mut self, generated: &str, source: &str) -> Result<(), GenError> {
        match self.taken.get(generated) {
            Some(first) if first != source => Err(GenError::NameCollision {
                scope: self.scope.clone(),
                first: first.clone(),
                second: source.to_string(),
                generated: generated.to_string(),
            }),
            _ => {
                self.taken.insert(generated.to_string(), source.to_string());
                Ok(())
            }
        }
    }
}

/// Runs the field dispatch over a resolved unit and produces its plan.
pub struct PlanBuilder<'a> {
    names: &'a dyn SymbolNames,
    options: &'a GeneratorOptions,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(names: &'a dyn SymbolNames, options: &'a GeneratorOptions) -> Self {
        Self { names, options }
    }

    /// Builds the plan for one unit. Top-level enums come first, then
    /// messages, each message carrying its nested types.
    pub fn build_unit(&self, unit: &ResolvedUnit) -> Result<UnitPlan, GenError> {
        let module = self.names.module_name(&unit.name);
        let mut functions = NameScope::new(format!("module {}", module));
        let ctx = DispatchContext {
            names: self.names,
            unit: &unit.name,
        };

        /* Dependency headers are included into this module, so their
         * records must not be redefined here */
        for included in &unit.included_messages {
            let record = self.names.record_name(&included.scope);
            functions.claim(&format!("#{}", record), &included.full_name)?;
        }

        let enums = unit
            .enums
            .iter()
            .map(|e| self.build_enum(e, &mut functions))
            .collect::<Result<Vec<_>, _>>()?;
        let messages = unit
            .messages
            .iter()
            .map(|m| self.build_message(&ctx, m, &mut functions))
            .collect::<Result<Vec<_>, _>>()?;

        let mut includes: Vec<String> = unit
            .dependencies
            .iter()
            .map(|dep| self.names.module_name(dep))
            .collect();
        includes.push(module.clone());

        let plan = UnitPlan::new(unit.name.clone(), module, includes, enums, messages);
        tracing::debug!(
            unit = %plan.unit_name,
            module = %plan.module,
            exports = plan.exports.len(),
            "built unit plan"
        );
        Ok(plan)
    }

    fn build_enum(&self, enum_type: &ResolvedEnum, functions: &mut NameScope) -> Result<EnumPlan, GenError> {
        let to_symbol = self.names.to_symbol_fn(&enum_type.scope);
        let from_symbol = self.names.from_symbol_fn(&enum_type.scope);
        functions.claim(&to_symbol, &enum_type.full_name)?;
        functions.claim(&from_symbol, &enum_type.full_name)?;

        let mut symbols = NameScope::new(format!("enum {}", enum_type.full_name));
        /* `undefined` is the absent-value sentinel of both conversions */
        symbols.claim(UNDEFINED_ATOM, "the undefined sentinel")?;
        let mut cases = Vec::with_capacity(enum_type.values.len());
        for value in &enum_type.values {
            let symbol = self.names.enum_symbol(&value.name);
            symbols.claim(&symbol, &value.name)?;
            cases.push(EnumCase {
                symbol,
                number: value.number,
            });
        }

        Ok(EnumPlan {
            full_name: enum_type.full_name.clone(),
            to_symbol,
            from_symbol,
            cases,
        })
    }

    fn build_message(
        &self,
        ctx: &DispatchContext<'_>,
        message: &ResolvedMessage,
        functions: &mut NameScope,
    ) -> Result<MessagePlan, GenError> {
        let nested_enums = message
            .nested_enums
            .iter()
            .map(|e| self.build_enum(e, functions))
            .collect::<Result<Vec<_>, _>>()?;
        let nested_messages = message
            .nested_messages
            .iter()
            .map(|m| self.build_message(ctx, m, functions))
            .collect::<Result<Vec<_>, _>>()?;

        let record = self.names.record_name(&message.scope);
        let encode_fn = self.names.encode_fn(&message.scope);
        let decode_fn = self.names.decode_fn(&message.scope);
        functions.claim(&format!("#{}", record), &message.full_name)?;
        functions.claim(&encode_fn, &message.full_name)?;
        functions.claim(&decode_fn, &message.full_name)?;

        let mut accessors = NameScope::new(format!("record {}", record));
        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            let plan = self.build_field(ctx, &message.full_name, field)?;
            accessors.claim(&plan.accessor, &field.name)?;
            fields.push(plan);
        }

        let has_clauses = fields.iter().any(|f| !f.decode.is_empty());
        Ok(MessagePlan {
            full_name: message.full_name.clone(),
            record,
            encode_fn,
            decode_fn,
            nested_enums,
            nested_messages,
            fields,
            skip_unmatched: self.options.skip_unknown_fields || !has_clauses,
        })
    }

    fn build_field(
        &self,
        ctx: &DispatchContext<'_>,
        message: &str,
        field: &ResolvedField,
    ) -> Result<FieldPlan, GenError> {
        let excluded = match field.kind {
            FieldKind::Group(_) => {
                match self.options.group_policy {
                    GroupPolicy::Ignore => {}
                    GroupPolicy::Warn => tracing::warn!(
                        message = %message,
                        field = %field.name,
                        number = field.number,
                        "group field left out of generated codec"
                    ),
                    GroupPolicy::Reject => {
                        return Err(GenError::UnsupportedGroup {
                            message: message.to_string(),
                            field: field.name.clone(),
                        });
                    }
                }
                Some(Exclusion::Group)
            }
            FieldKind::Enum(_) if field.is_repeated() => {
                tracing::debug!(
                    message = %message,
                    field = %field.name,
                    "packed entries of repeated enum field will be skipped by the decoder"
                );
                None
            }
            _ => None,
        };

        Ok(FieldPlan {
            name: field.name.clone(),
            accessor: self.names.field_accessor(&field.name),
            number: field.number,
            repeated: field.is_repeated(),
            decode: decode_clauses(ctx, field),
            encode: encode_op(ctx, field),
            excluded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::naming::ErlangNames;
    use crate::schema::TypeResolver;
    use erlpb_loader::{LoadedUnit, parse_unit};

    fn resolve(doc: &str) -> ResolvedUnit {
        let unit = parse_unit(doc).unwrap();
        let name = unit.name.clone();
        let mut resolver = TypeResolver::new();
        resolver.add_unit(LoadedUnit::from_unit(unit)).unwrap();
        resolver.resolve_unit(&name).unwrap()
    }

    const WITH_GROUP: &str = r#"
name: g.proto
messages:
  - name: M
    fields:
      - { name: id, number: 1, type: int32 }
      - { name: legacy, number: 2, type: group }
"#;

    #[test]
    fn group_policy_controls_exclusion() {
        let names = ErlangNames::default();
        let unit = resolve(WITH_GROUP);

        let options = GeneratorOptions::default();
        let plan = PlanBuilder::new(&names, &options).build_unit(&unit).unwrap();
        let legacy = &plan.messages[0].fields[1];
        assert_eq!(legacy.excluded, Some(Exclusion::Group));
        assert!(legacy.decode.is_empty());
        assert!(legacy.encode.is_none());

        let options = GeneratorOptions {
            group_policy: GroupPolicy::Reject,
            ..GeneratorOptions::default()
        };
        let err = PlanBuilder::new(&names, &options).build_unit(&unit).unwrap_err();
        assert!(matches!(err, GenError::UnsupportedGroup { ref field, .. } if field == "legacy"));
    }

    #[test]
    fn wildcard_clause_is_forced_when_nothing_decodes() {
        let names = ErlangNames::default();
        let options = GeneratorOptions {
            skip_unknown_fields: false,
            ..GeneratorOptions::default()
        };
        let unit = resolve("name: e.proto\nmessages:\n  - name: Empty\n  - name: One\n    fields:\n      - { name: a, number: 1, type: bool }\n");
        let plan = PlanBuilder::new(&names, &options).build_unit(&unit).unwrap();
        assert!(plan.messages[0].skip_unmatched);
        assert!(!plan.messages[1].skip_unmatched);
    }

    #[test]
    fn colliding_names_are_rejected() {
        let names = ErlangNames::default();
        let options = GeneratorOptions::default();
        let unit = resolve(
            "name: c.proto\nmessages:\n  - name: M\n    fields:\n      - { name: fooBar, number: 1, type: int32 }\n      - { name: foo_bar, number: 2, type: int32 }\n",
        );
        let err = PlanBuilder::new(&names, &options).build_unit(&unit).unwrap_err();
        assert!(matches!(err, GenError::NameCollision { ref generated, .. } if generated == "foo_bar"));

        /* Outer.Inner and OuterInner share one record name */
        let unit = resolve("name: d.proto\nmessages:\n  - name: OuterInner\n  - name: Outer\n    nested-messages:\n      - name: Inner\n");
        assert!(matches!(
            PlanBuilder::new(&names, &options).build_unit(&unit),
            Err(GenError::NameCollision { .. })
        ));
    }

    #[test]
    fn enum_value_cannot_take_the_undefined_atom() {
        let names = ErlangNames::default();
        let options = GeneratorOptions::default();
        let unit = resolve("name: s.proto\nenums:\n  - name: Status\n    values: [{ name: UNDEFINED, number: 0 }, { name: OK, number: 1 }]\n");
        let err = PlanBuilder::new(&names, &options).build_unit(&unit).unwrap_err();
        assert!(matches!(
            err,
            GenError::NameCollision { ref generated, ref second, .. } if generated == "undefined" && second == "UNDEFINED"
        ));

        /* prefixed variants stay usable */
        let unit = resolve("name: t.proto\nenums:\n  - name: Status\n    values: [{ name: STATUS_UNDEFINED, number: 0 }]\n");
        let plan = PlanBuilder::new(&names, &options).build_unit(&unit).unwrap();
        assert_eq!(plan.enums[0].cases[0].symbol, "status_undefined");
    }

    #[test]
    fn records_of_included_units_are_not_redefined() {
        let names = ErlangNames::default();
        let options = GeneratorOptions::default();
        let mut resolver = TypeResolver::new();
        for doc in [
            "name: common.proto\npackage: common\nmessages:\n  - name: Point\n",
            "name: geo.proto\npackage: geo\ndependencies: [common.proto]\nmessages:\n  - name: Point\n",
            "name: map.proto\npackage: map\ndependencies: [common.proto]\nmessages:\n  - name: Tile\n",
        ] {
            resolver.add_unit(LoadedUnit::from_unit(parse_unit(doc).unwrap())).unwrap();
        }

        let geo = resolver.resolve_unit("geo.proto").unwrap();
        let err = PlanBuilder::new(&names, &options).build_unit(&geo).unwrap_err();
        assert!(matches!(
            err,
            GenError::NameCollision { ref first, ref second, ref generated, .. }
                if first == ".common.Point" && second == ".geo.Point" && generated == "#point"
        ));

        let map = resolver.resolve_unit("map.proto").unwrap();
        assert_eq!(map.included_messages.len(), 1);
        assert!(PlanBuilder::new(&names, &options).build_unit(&map).is_ok());
    }

    #[test]
    fn includes_list_dependencies_then_self() {
        let names = ErlangNames::default();
        let options = GeneratorOptions::default();
        let mut resolver = TypeResolver::new();
        for doc in [
            "name: common.proto\nenums:\n  - name: Color\n    values: [{ name: RED, number: 0 }]\n",
            "name: shapes.proto\ndependencies: [common.proto]\nmessages:\n  - name: Shape\n    fields:\n      - { name: color, number: 1, type: enum, type-name: .Color }\n",
        ] {
            resolver.add_unit(LoadedUnit::from_unit(parse_unit(doc).unwrap())).unwrap();
        }
        let unit = resolver.resolve_unit("shapes.proto").unwrap();
        let plan = PlanBuilder::new(&names, &options).build_unit(&unit).unwrap();
        assert_eq!(plan.includes, vec!["common_pb".to_string(), "shapes_pb".to_string()]);
    }
}

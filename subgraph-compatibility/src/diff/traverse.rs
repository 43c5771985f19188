use apollo_compiler::Name;
use apollo_compiler::Node;
use apollo_compiler::Schema;
use apollo_compiler::ast::Directive;
use apollo_compiler::ast::DirectiveDefinition;
use apollo_compiler::ast::FieldDefinition;
use apollo_compiler::ast::InputValueDefinition;
use apollo_compiler::collections::IndexMap;
use apollo_compiler::collections::IndexSet;
use apollo_compiler::schema::Component;
use apollo_compiler::schema::ComponentName;
use apollo_compiler::schema::ExtendedType;
use itertools::Itertools;

use crate::diff::change::Change;
use crate::diff::change::ChangeKind;

/// Traverse the expected and actual schemas, collecting every change from one to the other.
pub(crate) fn traverse_schemas(expected: &Schema, actual: &Schema) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_schema_definition(expected, actual, &mut changes);
    diff_directive_definitions(expected, actual, &mut changes);
    diff_types(expected, actual, &mut changes);
    changes
}

fn diff_schema_definition(expected: &Schema, actual: &Schema, changes: &mut Vec<Change>) {
    let expected_def = &expected.schema_definition;
    let actual_def = &actual.schema_definition;
    for (kind, expected_root, actual_root) in [
        (
            ChangeKind::ChangeQueryType,
            &expected_def.query,
            &actual_def.query,
        ),
        (
            ChangeKind::ChangeMutationType,
            &expected_def.mutation,
            &actual_def.mutation,
        ),
        (
            ChangeKind::ChangeSubscriptionType,
            &expected_def.subscription,
            &actual_def.subscription,
        ),
    ] {
        let expected_root = expected_root.as_ref().map(|root| root.name.as_str());
        let actual_root = actual_root.as_ref().map(|root| root.name.as_str());
        if expected_root != actual_root {
            changes.push(Change::new("schema", kind).with_detail(actual_root.unwrap_or_default()));
        }
    }
    diff_directives(
        "schema",
        expected_def.directives.iter().map(|d| &d.node),
        actual_def.directives.iter().map(|d| &d.node),
        changes,
    );
}

fn diff_directive_definitions(expected: &Schema, actual: &Schema, changes: &mut Vec<Change>) {
    for (name, expected_def) in &expected.directive_definitions {
        let path = format!("@{name}");
        let Some(actual_def) = actual.directive_definitions.get(name) else {
            changes.push(Change::new(path, ChangeKind::RemoveDirectiveDefinition));
            continue;
        };
        diff_directive_definition(&path, expected_def, actual_def, changes);
    }
    for (name, actual_def) in &actual.directive_definitions {
        if !expected.directive_definitions.contains_key(name) {
            changes.push(
                Change::new(format!("@{name}"), ChangeKind::AddDirectiveDefinition)
                    .with_detail(actual_def.to_string().trim_end()),
            );
        }
    }
}

fn diff_directive_definition(
    path: &str,
    expected: &DirectiveDefinition,
    actual: &DirectiveDefinition,
    changes: &mut Vec<Change>,
) {
    if expected.repeatable != actual.repeatable {
        let detail = if actual.repeatable {
            "repeatable"
        } else {
            "non-repeatable"
        };
        changes.push(Change::new(path, ChangeKind::ChangeDirectiveRepeatable).with_detail(detail));
    }
    let locations = |def: &DirectiveDefinition| {
        def.locations
            .iter()
            .map(|location| location.to_string())
            .sorted()
            .collect::<Vec<_>>()
    };
    let actual_locations = locations(actual);
    if locations(expected) != actual_locations {
        changes.push(
            Change::new(path, ChangeKind::ChangeDirectiveLocations)
                .with_detail(actual_locations.join(" | ")),
        );
    }
    diff_input_values(
        path,
        expected.arguments.iter().map(|arg| &**arg),
        actual.arguments.iter().map(|arg| &**arg),
        InputValueKinds::ARGUMENT,
        changes,
    );
}

fn diff_types(expected: &Schema, actual: &Schema, changes: &mut Vec<Change>) {
    for (name, expected_type) in &expected.types {
        if expected_type.is_built_in() {
            continue;
        }
        match actual.types.get(name) {
            None => changes.push(Change::new(name.as_str(), removed_kind(expected_type))),
            Some(actual_type) if kind_name(expected_type) != kind_name(actual_type) => {
                changes.push(
                    Change::new(name.as_str(), ChangeKind::ChangeTypeKind)
                        .with_detail(kind_name(actual_type)),
                );
            }
            Some(actual_type) => diff_type(name, expected_type, actual_type, changes),
        }
    }
    for (name, actual_type) in &actual.types {
        if !actual_type.is_built_in() && !expected.types.contains_key(name) {
            changes.push(Change::new(name.as_str(), added_kind(actual_type)));
        }
    }
}

fn diff_type(
    name: &Name,
    expected: &ExtendedType,
    actual: &ExtendedType,
    changes: &mut Vec<Change>,
) {
    diff_description(
        name.as_str(),
        type_description(expected),
        type_description(actual),
        changes,
    );
    diff_directives(
        name.as_str(),
        expected.directives().iter().map(|d| &d.node),
        actual.directives().iter().map(|d| &d.node),
        changes,
    );

    match (expected, actual) {
        (ExtendedType::Object(expected), ExtendedType::Object(actual)) => {
            diff_interfaces(
                name,
                &expected.implements_interfaces,
                &actual.implements_interfaces,
                changes,
            );
            diff_fields(name, &expected.fields, &actual.fields, changes);
        }
        (ExtendedType::Interface(expected), ExtendedType::Interface(actual)) => {
            diff_interfaces(
                name,
                &expected.implements_interfaces,
                &actual.implements_interfaces,
                changes,
            );
            diff_fields(name, &expected.fields, &actual.fields, changes);
        }
        (ExtendedType::Union(expected), ExtendedType::Union(actual)) => {
            for member in expected.members.difference(&actual.members) {
                changes.push(Change::new(
                    format!("{name}.{}", member.name),
                    ChangeKind::RemoveUnionMember,
                ));
            }
            for member in actual.members.difference(&expected.members) {
                changes.push(Change::new(
                    format!("{name}.{}", member.name),
                    ChangeKind::AddUnionMember,
                ));
            }
        }
        (ExtendedType::Enum(expected), ExtendedType::Enum(actual)) => {
            for (value_name, expected_value) in &expected.values {
                let path = format!("{name}.{value_name}");
                match actual.values.get(value_name) {
                    None => changes.push(Change::new(path, ChangeKind::RemoveEnumValue)),
                    Some(actual_value) => {
                        diff_description(
                            &path,
                            expected_value.description.as_deref(),
                            actual_value.description.as_deref(),
                            changes,
                        );
                        diff_directives(
                            &path,
                            expected_value.directives.iter(),
                            actual_value.directives.iter(),
                            changes,
                        );
                    }
                }
            }
            for value_name in actual.values.keys() {
                if !expected.values.contains_key(value_name) {
                    changes.push(Change::new(
                        format!("{name}.{value_name}"),
                        ChangeKind::AddEnumValue,
                    ));
                }
            }
        }
        (ExtendedType::InputObject(expected), ExtendedType::InputObject(actual)) => {
            diff_input_values(
                name.as_str(),
                expected.fields.values().map(|field| &*field.node),
                actual.fields.values().map(|field| &*field.node),
                InputValueKinds::INPUT_FIELD,
                changes,
            );
        }
        _ => {}
    }
}

fn diff_interfaces(
    name: &Name,
    expected: &IndexSet<ComponentName>,
    actual: &IndexSet<ComponentName>,
    changes: &mut Vec<Change>,
) {
    for interface in expected.difference(actual) {
        changes.push(Change::new(
            format!("{name}.&{}", interface.name),
            ChangeKind::RemoveInterfaceImplementation,
        ));
    }
    for interface in actual.difference(expected) {
        changes.push(Change::new(
            format!("{name}.&{}", interface.name),
            ChangeKind::AddInterfaceImplementation,
        ));
    }
}

fn diff_fields(
    type_name: &Name,
    expected: &IndexMap<Name, Component<FieldDefinition>>,
    actual: &IndexMap<Name, Component<FieldDefinition>>,
    changes: &mut Vec<Change>,
) {
    for (field_name, expected_field) in expected {
        let path = format!("{type_name}.{field_name}");
        let Some(actual_field) = actual.get(field_name) else {
            changes.push(Change::new(path, ChangeKind::RemoveField));
            continue;
        };
        if expected_field.ty != actual_field.ty {
            changes.push(
                Change::new(&path, ChangeKind::ChangeFieldType)
                    .with_detail(actual_field.ty.to_string()),
            );
        }
        diff_description(
            &path,
            expected_field.description.as_deref(),
            actual_field.description.as_deref(),
            changes,
        );
        diff_directives(
            &path,
            expected_field.directives.iter(),
            actual_field.directives.iter(),
            changes,
        );
        diff_input_values(
            &path,
            expected_field.arguments.iter().map(|arg| &**arg),
            actual_field.arguments.iter().map(|arg| &**arg),
            InputValueKinds::ARGUMENT,
            changes,
        );
    }
    for (field_name, actual_field) in actual {
        if !expected.contains_key(field_name) {
            changes.push(
                Change::new(format!("{type_name}.{field_name}"), ChangeKind::AddField)
                    .with_detail(actual_field.node.to_string()),
            );
        }
    }
}

/// Change kinds reported for input values, which are either field arguments or input object
/// fields.
struct InputValueKinds {
    added: ChangeKind,
    removed: ChangeKind,
    type_changed: ChangeKind,
}

impl InputValueKinds {
    const ARGUMENT: InputValueKinds = InputValueKinds {
        added: ChangeKind::AddFieldArgument,
        removed: ChangeKind::RemoveFieldArgument,
        type_changed: ChangeKind::ChangeFieldArgumentType,
    };
    const INPUT_FIELD: InputValueKinds = InputValueKinds {
        added: ChangeKind::AddField,
        removed: ChangeKind::RemoveField,
        type_changed: ChangeKind::ChangeFieldType,
    };
}

fn diff_input_values<'a>(
    parent: &str,
    expected: impl Iterator<Item = &'a InputValueDefinition>,
    actual: impl Iterator<Item = &'a InputValueDefinition>,
    kinds: InputValueKinds,
    changes: &mut Vec<Change>,
) {
    let expected: IndexMap<&Name, &InputValueDefinition> =
        expected.map(|value| (&value.name, value)).collect();
    let actual: IndexMap<&Name, &InputValueDefinition> =
        actual.map(|value| (&value.name, value)).collect();

    for (name, expected_value) in &expected {
        let path = format!("{parent}.{name}");
        let Some(actual_value) = actual.get(name) else {
            changes.push(Change::new(path, kinds.removed));
            continue;
        };
        if expected_value.ty != actual_value.ty {
            changes.push(
                Change::new(&path, kinds.type_changed).with_detail(actual_value.ty.to_string()),
            );
        }
        match (&expected_value.default_value, &actual_value.default_value) {
            (None, Some(default)) => changes.push(
                Change::new(&path, ChangeKind::AddFieldArgumentDefault)
                    .with_detail(default.to_string()),
            ),
            (Some(_), None) => {
                changes.push(Change::new(&path, ChangeKind::RemoveFieldArgumentDefault))
            }
            (Some(expected_default), Some(actual_default))
                if expected_default.to_string() != actual_default.to_string() =>
            {
                changes.push(
                    Change::new(&path, ChangeKind::ChangeFieldArgumentDefault)
                        .with_detail(actual_default.to_string()),
                )
            }
            _ => {}
        }
        diff_description(
            &path,
            expected_value.description.as_deref(),
            actual_value.description.as_deref(),
            changes,
        );
        diff_directives(
            &path,
            expected_value.directives.iter(),
            actual_value.directives.iter(),
            changes,
        );
    }
    for (name, actual_value) in &actual {
        if !expected.contains_key(name) {
            changes.push(
                Change::new(format!("{parent}.{name}"), kinds.added)
                    .with_detail(actual_value.to_string()),
            );
        }
    }
}

fn diff_description(
    path: &str,
    expected: Option<&str>,
    actual: Option<&str>,
    changes: &mut Vec<Change>,
) {
    if expected != actual {
        changes.push(
            Change::new(path, ChangeKind::ChangeDescription)
                .with_detail(actual.unwrap_or_default()),
        );
    }
}

/// Compares directive applications as multisets, so that repeated applications (several `@key`
/// on one entity) are matched one for one and argument order is irrelevant.
fn diff_directives<'a>(
    path: &str,
    expected: impl Iterator<Item = &'a Node<Directive>>,
    actual: impl Iterator<Item = &'a Node<Directive>>,
    changes: &mut Vec<Change>,
) {
    let mut unmatched: Vec<String> = actual.map(|directive| application(directive)).collect();
    for expected_application in expected.map(|directive| application(directive)) {
        match unmatched.iter().position(|a| *a == expected_application) {
            Some(index) => {
                unmatched.remove(index);
            }
            None => changes.push(
                Change::new(path, ChangeKind::RemoveDirectiveApplication)
                    .with_detail(expected_application),
            ),
        }
    }
    for actual_application in unmatched {
        changes.push(
            Change::new(path, ChangeKind::AddDirectiveApplication).with_detail(actual_application),
        );
    }
}

/// A directive application with its arguments sorted by name.
fn application(directive: &Directive) -> String {
    if directive.arguments.is_empty() {
        return format!("@{}", directive.name);
    }
    let arguments = directive
        .arguments
        .iter()
        .sorted_by(|a, b| a.name.as_str().cmp(b.name.as_str()))
        .map(|argument| format!("{}: {}", argument.name, argument.value))
        .join(", ");
    format!("@{}({arguments})", directive.name)
}

fn type_description(ty: &ExtendedType) -> Option<&str> {
    match ty {
        ExtendedType::Scalar(ty) => ty.description.as_deref(),
        ExtendedType::Object(ty) => ty.description.as_deref(),
        ExtendedType::Interface(ty) => ty.description.as_deref(),
        ExtendedType::Union(ty) => ty.description.as_deref(),
        ExtendedType::Enum(ty) => ty.description.as_deref(),
        ExtendedType::InputObject(ty) => ty.description.as_deref(),
    }
}

fn kind_name(ty: &ExtendedType) -> &'static str {
    match ty {
        ExtendedType::Scalar(_) => "scalar",
        ExtendedType::Object(_) => "type",
        ExtendedType::Interface(_) => "interface",
        ExtendedType::Union(_) => "union",
        ExtendedType::Enum(_) => "enum",
        ExtendedType::InputObject(_) => "input",
    }
}

fn removed_kind(ty: &ExtendedType) -> ChangeKind {
    match ty {
        ExtendedType::Scalar(_) => ChangeKind::RemoveScalar,
        ExtendedType::Object(_) => ChangeKind::RemoveObjectType,
        ExtendedType::Interface(_) => ChangeKind::RemoveInterface,
        ExtendedType::Union(_) => ChangeKind::RemoveUnion,
        ExtendedType::Enum(_) => ChangeKind::RemoveEnum,
        ExtendedType::InputObject(_) => ChangeKind::RemoveInputObject,
    }
}

fn added_kind(ty: &ExtendedType) -> ChangeKind {
    match ty {
        ExtendedType::Scalar(_) => ChangeKind::AddScalar,
        ExtendedType::Object(_) => ChangeKind::AddObjectType,
        ExtendedType::Interface(_) => ChangeKind::AddInterface,
        ExtendedType::Union(_) => ChangeKind::AddUnion,
        ExtendedType::Enum(_) => ChangeKind::AddEnum,
        ExtendedType::InputObject(_) => ChangeKind::AddInputObject,
    }
}

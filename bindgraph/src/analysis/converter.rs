//! External converters and self-coding types.

use tracing::debug;

use super::Analysis;
use crate::diagnostics::Diagnostic;
use crate::markers;
use crate::model::{ObjectKind, StructDescriptor};
use crate::signature;
use crate::symbols::{Annotated, Element, FieldSymbol, TypeSymbol, simple_name_of};

fn find_field<'s>(symbol: &'s TypeSymbol, name: &str) -> Option<&'s FieldSymbol> {
    symbol.fields.iter().find(|f| f.name == name)
}

fn implements(symbol: &TypeSymbol, interface: &str) -> bool {
    symbol
        .supertypes
        .iter()
        .any(|s| signature::raw_name(s) == interface)
}

impl<'a> Analysis<'a> {
    /// Register every converter-marked type as the codec of its `target`.
    ///
    /// Returns the configuration types found among them.
    #[tracing::instrument(level = "debug", skip_all, fields(converters = converters.len()))]
    pub fn process_converters(&mut self, converters: &[Element]) -> Vec<String> {
        let mut configurations = Vec::new();
        for element in converters {
            let Element::Type { name } = element else {
                continue;
            };
            let Some(converter) = self.lookup(name) else {
                continue;
            };
            self.register_converter(converter);

            if converter.is_abstract() {
                continue;
            }
            if converter.name == markers::CONFIGURATION
                || implements(converter, markers::CONFIGURATION)
            {
                let configuration = match &converter.enclosing {
                    Some(outer) => format!("{outer}${}", converter.simple_name),
                    None => converter.name.clone(),
                };
                debug!(%configuration, "configuration found");
                configurations.push(configuration);
            }
        }
        self.configurations.extend(configurations.iter().cloned());
        configurations
    }

    fn register_converter(&mut self, converter: &'a TypeSymbol) {
        let Some(target) = converter
            .annotation(markers::JSON_CONVERTER)
            .and_then(|a| a.get(markers::TARGET))
            .and_then(|v| v.as_type())
        else {
            return;
        };
        let target_symbol = self.lookup(target);
        self.validate_converter(&converter.name, target_symbol, target);
        if self.structs.contains_key(target) {
            return;
        }
        let simple_name = target_symbol.map_or_else(|| simple_name_of(target), |s| s.simple_name.as_str());
        let mut info = StructDescriptor::new(
            target,
            simple_name,
            ObjectKind::Class,
            format!("struct{}", self.structs.len()),
            markers::JSON_CONVERTER,
        );
        info.is_external_adapter = true;
        info.converter = Some(converter.name.clone());
        debug!(target, converter = %converter.name, "external converter registered");
        self.structs.insert(target.to_string(), info);
    }

    /// Check that `converter` can encode `full_name`: both types are reachable
    /// and the converter exposes correctly typed public static reader and
    /// writer fields. Reports the first problem found.
    pub(crate) fn validate_converter(
        &mut self,
        converter: &str,
        target: Option<&TypeSymbol>,
        full_name: &str,
    ) {
        let location = Element::ty(converter);
        let problem = match self.lookup(converter) {
            None => Some(format!("Specified converter: '{converter}' cannot be found")),
            Some(symbol) => converter_problem(symbol, target, full_name),
        };
        if let Some(problem) = problem {
            self.report(
                Diagnostic::error(problem)
                    .at(location)
                    .declared_by(markers::JSON_CONVERTER),
            );
        }
    }

    /// Whether `symbol` encodes itself. The reader field is validated the
    /// first time a type is seen.
    pub(crate) fn is_self_coding(&mut self, symbol: &TypeSymbol) -> bool {
        if let Some(known) = self.self_coding.get(&symbol.name) {
            return *known;
        }
        let self_coding = implements(symbol, markers::JSON_OBJECT);
        self.self_coding.insert(symbol.name.clone(), self_coding);
        if !self_coding {
            return false;
        }

        let name = &symbol.name;
        let expected = format!("{}<{name}>", markers::READ_JSON_OBJECT);
        let interface = markers::JSON_OBJECT;
        let reader = markers::READER_FIELD;
        let mut problems = Vec::new();
        match find_field(symbol, reader) {
            None => problems.push(format!(
                "'{name}' is '{interface}', but it doesn't have {reader} field. \
                 It can't be used for serialization/deserialization this way. \
                 You probably want to add public static {reader} field."
            )),
            Some(field) => {
                if !field.modifiers.public || !field.modifiers.is_static {
                    problems.push(format!(
                        "'{name}' is '{interface}', but it's {reader} field is not public and static. \
                         It can't be used for serialization/deserialization this way. \
                         You probably want to change {reader} field so it's public and static."
                    ));
                }
                if field.ty != expected {
                    problems.push(format!(
                        "'{name}' is '{interface}', but it's {reader} field is not of correct type. \
                         It can't be used for serialization/deserialization this way. \
                         You probably want to change {reader} field to: '{expected}'"
                    ));
                }
            }
        }
        for problem in problems {
            self.report(Diagnostic::error(problem).at(Element::ty(name)));
        }
        true
    }
}

fn converter_problem(
    converter: &TypeSymbol,
    target: Option<&TypeSymbol>,
    full_name: &str,
) -> Option<String> {
    let name = &converter.name;
    let (reader_name, writer_name) = (markers::READER_FIELD, markers::WRITER_FIELD);
    let reader = find_field(converter, reader_name);
    let writer = find_field(converter, writer_name);

    if !converter.modifiers.public {
        return Some(format!("Specified converter: '{name}' must be public"));
    }
    if target.is_some_and(|t| !t.modifiers.public) {
        return Some(format!("Specified converter target: '{full_name}' must be public"));
    }
    if converter.is_nested() && !converter.modifiers.is_static {
        return Some(format!(
            "Specified converter: '{name}' can't be a nested member. Only public static nested types are supported"
        ));
    }
    if converter.is_unaddressable() {
        return Some(format!(
            "Specified converter: '{name}' is defined without a namespace and cannot be accessed"
        ));
    }
    let (Some(reader), Some(writer)) = (reader, writer) else {
        return Some(format!(
            "Specified converter: '{name}' doesn't have a {reader_name} or {writer_name} field. \
             It must have public static {reader_name}/{writer_name} fields for conversion."
        ));
    };
    let exposed = |f: &FieldSymbol| f.modifiers.public && f.modifiers.is_static;
    if !exposed(reader) || !exposed(writer) {
        return Some(format!(
            "Specified converter: '{name}' doesn't have public and static {reader_name} and {writer_name} fields. \
             They must be public and static for converter to work properly."
        ));
    }
    let read_type = format!("{}<{full_name}>", markers::READ_OBJECT);
    if reader.ty != read_type {
        return Some(format!(
            "Specified converter: '{name}' has invalid type for {reader_name} field. It must be of type: '{read_type}'"
        ));
    }
    let write_type = format!("{}<{full_name}>", markers::WRITE_OBJECT);
    if writer.ty != write_type {
        return Some(format!(
            "Specified converter: '{name}' has invalid type for {writer_name} field. It must be of type: '{write_type}'"
        ));
    }
    None
}

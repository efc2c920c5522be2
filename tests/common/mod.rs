//! Shared helpers: a class file emitter and a jar writer.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use jars_deps::analysis::{AnalysisConfig, ArchiveDescriptor};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

pub fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Annotation element values.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Str(String),
    Enum { descriptor: String, constant: String },
    Class(String),
    Nested(Annotation),
    Array(Vec<Value>),
    /// Arbitrary tag byte followed by a zero index, for malformed input.
    Raw(u8),
}

#[derive(Debug, Clone)]
pub struct Annotation {
    pub descriptor: String,
    pub visible: bool,
    pub values: Vec<(String, Value)>,
}

impl Annotation {
    pub fn visible(descriptor: &str) -> Self {
        Self {
            descriptor: descriptor.to_string(),
            visible: true,
            values: Vec::new(),
        }
    }

    pub fn invisible(descriptor: &str) -> Self {
        Self {
            visible: false,
            ..Self::visible(descriptor)
        }
    }

    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.values.push((name.to_string(), value));
        self
    }
}

/// Bytecode instructions the emitter knows how to encode.
#[derive(Debug, Clone)]
pub enum Insn {
    Aload0,
    Pop,
    Return,
    Areturn,
    GetField { owner: String, name: String, descriptor: String },
    PutStatic { owner: String, name: String, descriptor: String },
    InvokeVirtual { owner: String, name: String, descriptor: String },
    InvokeStatic { owner: String, name: String, descriptor: String },
    InvokeInterface { owner: String, name: String, descriptor: String },
    InvokeDynamic { name: String, descriptor: String },
    New(String),
    CheckCast(String),
    LdcClass(String),
    MultiANewArray { descriptor: String, dimensions: u8 },
    /// `iconst_0; tableswitch` with two targets, all jumping to the next
    /// instruction.
    TableSwitch,
    /// `iconst_0; lookupswitch` with one pair.
    LookupSwitch,
    /// `wide iinc 300, 1000`
    WideIinc,
}

pub fn get_field(owner: &str, name: &str, descriptor: &str) -> Insn {
    Insn::GetField {
        owner: owner.into(),
        name: name.into(),
        descriptor: descriptor.into(),
    }
}

pub fn put_static(owner: &str, name: &str, descriptor: &str) -> Insn {
    Insn::PutStatic {
        owner: owner.into(),
        name: name.into(),
        descriptor: descriptor.into(),
    }
}

pub fn invoke_virtual(owner: &str, name: &str, descriptor: &str) -> Insn {
    Insn::InvokeVirtual {
        owner: owner.into(),
        name: name.into(),
        descriptor: descriptor.into(),
    }
}

pub fn invoke_static(owner: &str, name: &str, descriptor: &str) -> Insn {
    Insn::InvokeStatic {
        owner: owner.into(),
        name: name.into(),
        descriptor: descriptor.into(),
    }
}

pub fn invoke_interface(owner: &str, name: &str, descriptor: &str) -> Insn {
    Insn::InvokeInterface {
        owner: owner.into(),
        name: name.into(),
        descriptor: descriptor.into(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Method {
    pub name: String,
    pub descriptor: String,
    pub code: Vec<Insn>,
    pub annotations: Vec<Annotation>,
    pub parameter_annotations: Vec<Vec<Annotation>>,
    pub annotation_default: Option<Value>,
}

impl Method {
    pub fn new(name: &str, descriptor: &str) -> Self {
        Self {
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            ..Self::default()
        }
    }

    pub fn code(mut self, code: Vec<Insn>) -> Self {
        self.code = code;
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn parameter_annotations(mut self, annotations: Vec<Vec<Annotation>>) -> Self {
        self.parameter_annotations = annotations;
        self
    }

    pub fn annotation_default(mut self, value: Value) -> Self {
        self.annotation_default = Some(value);
        self
    }
}

/// Emits structurally valid class files.
pub struct ClassFileBuilder {
    pool: Vec<u8>,
    pool_count: u16,
    utf8_indices: HashMap<String, u16>,
    this_class: u16,
    super_class: u16,
    interfaces: Vec<u16>,
    fields: Vec<u8>,
    fields_count: u16,
    methods: Vec<u8>,
    methods_count: u16,
    attributes: Vec<u8>,
    attributes_count: u16,
    class_annotations: Vec<Annotation>,
}

impl ClassFileBuilder {
    /// A class named by its internal name, extending `java/lang/Object`.
    pub fn new(internal_name: &str) -> Self {
        let mut builder = Self {
            pool: Vec::new(),
            pool_count: 1,
            utf8_indices: HashMap::new(),
            this_class: 0,
            super_class: 0,
            interfaces: Vec::new(),
            fields: Vec::new(),
            fields_count: 0,
            methods: Vec::new(),
            methods_count: 0,
            attributes: Vec::new(),
            attributes_count: 0,
            class_annotations: Vec::new(),
        };
        builder.this_class = builder.class(internal_name);
        builder.super_class = builder.class("java/lang/Object");
        builder
    }

    pub fn extends(mut self, internal_name: &str) -> Self {
        self.super_class = self.class(internal_name);
        self
    }

    pub fn implements(mut self, internal_name: &str) -> Self {
        let index = self.class(internal_name);
        self.interfaces.push(index);
        self
    }

    pub fn field(self, name: &str, descriptor: &str) -> Self {
        self.annotated_field(name, descriptor, Vec::new())
    }

    pub fn annotated_field(
        mut self,
        name: &str,
        descriptor: &str,
        annotations: Vec<Annotation>,
    ) -> Self {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let attributes = self.annotation_attributes(&annotations);

        let mut out = Vec::new();
        put_u2(&mut out, 0x0002);
        put_u2(&mut out, name_index);
        put_u2(&mut out, descriptor_index);
        put_u2(&mut out, attributes.len() as u16);
        for attribute in attributes {
            out.extend(attribute);
        }
        self.fields.extend(out);
        self.fields_count += 1;
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        let name_index = self.utf8(&method.name);
        let descriptor_index = self.utf8(&method.descriptor);

        let mut attributes = Vec::new();
        if !method.code.is_empty() {
            attributes.push(self.code_attribute(&method.code));
        }
        attributes.extend(self.annotation_attributes(&method.annotations));
        if !method.parameter_annotations.is_empty() {
            let mut body = Vec::new();
            body.push(method.parameter_annotations.len() as u8);
            for annotations in &method.parameter_annotations {
                put_u2(&mut body, annotations.len() as u16);
                for annotation in annotations {
                    self.encode_annotation(annotation, &mut body);
                }
            }
            attributes.push(self.attribute("RuntimeVisibleParameterAnnotations", body));
        }
        if let Some(value) = &method.annotation_default {
            let mut body = Vec::new();
            self.encode_value(value, &mut body);
            attributes.push(self.attribute("AnnotationDefault", body));
        }

        let mut out = Vec::new();
        put_u2(&mut out, 0x0001);
        put_u2(&mut out, name_index);
        put_u2(&mut out, descriptor_index);
        put_u2(&mut out, attributes.len() as u16);
        for attribute in attributes {
            out.extend(attribute);
        }
        self.methods.extend(out);
        self.methods_count += 1;
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.class_annotations.push(annotation);
        self
    }

    /// Generic `Signature` attribute on the class; not a reference source.
    pub fn signature(mut self, signature: &str) -> Self {
        let index = self.utf8(signature);
        let mut body = Vec::new();
        put_u2(&mut body, index);
        let attribute = self.attribute("Signature", body);
        self.attributes.extend(attribute);
        self.attributes_count += 1;
        self
    }

    pub fn build(mut self) -> Vec<u8> {
        let class_annotations = std::mem::take(&mut self.class_annotations);
        for attribute in self.annotation_attributes(&class_annotations) {
            self.attributes.extend(attribute);
            self.attributes_count += 1;
        }
        let source_file = self.utf8("Generated.java");
        let mut body = Vec::new();
        put_u2(&mut body, source_file);
        let attribute = self.attribute("SourceFile", body);
        self.attributes.extend(attribute);
        self.attributes_count += 1;

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        put_u2(&mut out, 0);
        put_u2(&mut out, 52);
        put_u2(&mut out, self.pool_count);
        out.extend_from_slice(&self.pool);
        put_u2(&mut out, 0x0021);
        put_u2(&mut out, self.this_class);
        put_u2(&mut out, self.super_class);
        put_u2(&mut out, self.interfaces.len() as u16);
        for interface in &self.interfaces {
            put_u2(&mut out, *interface);
        }
        put_u2(&mut out, self.fields_count);
        out.extend_from_slice(&self.fields);
        put_u2(&mut out, self.methods_count);
        out.extend_from_slice(&self.methods);
        put_u2(&mut out, self.attributes_count);
        out.extend_from_slice(&self.attributes);
        out
    }

    fn next_index(&mut self, slots: u16) -> u16 {
        let index = self.pool_count;
        self.pool_count += slots;
        index
    }

    fn utf8(&mut self, value: &str) -> u16 {
        if let Some(index) = self.utf8_indices.get(value) {
            return *index;
        }
        let index = self.next_index(1);
        self.pool.push(1);
        put_u2(&mut self.pool, value.len() as u16);
        self.pool.extend_from_slice(value.as_bytes());
        self.utf8_indices.insert(value.to_string(), index);
        index
    }

    fn integer(&mut self, value: i32) -> u16 {
        let index = self.next_index(1);
        self.pool.push(3);
        self.pool.extend_from_slice(&value.to_be_bytes());
        index
    }

    fn long(&mut self, value: i64) -> u16 {
        let index = self.next_index(2);
        self.pool.push(5);
        self.pool.extend_from_slice(&value.to_be_bytes());
        index
    }

    fn class(&mut self, internal_name: &str) -> u16 {
        let name_index = self.utf8(internal_name);
        let index = self.next_index(1);
        self.pool.push(7);
        put_u2(&mut self.pool, name_index);
        index
    }

    fn name_and_type(&mut self, name: &str, descriptor: &str) -> u16 {
        let name_index = self.utf8(name);
        let descriptor_index = self.utf8(descriptor);
        let index = self.next_index(1);
        self.pool.push(12);
        put_u2(&mut self.pool, name_index);
        put_u2(&mut self.pool, descriptor_index);
        index
    }

    fn member_ref(&mut self, tag: u8, owner: &str, name: &str, descriptor: &str) -> u16 {
        let class_index = self.class(owner);
        let nat_index = self.name_and_type(name, descriptor);
        let index = self.next_index(1);
        self.pool.push(tag);
        put_u2(&mut self.pool, class_index);
        put_u2(&mut self.pool, nat_index);
        index
    }

    fn invoke_dynamic(&mut self, name: &str, descriptor: &str) -> u16 {
        let nat_index = self.name_and_type(name, descriptor);
        let index = self.next_index(1);
        self.pool.push(18);
        put_u2(&mut self.pool, 0);
        put_u2(&mut self.pool, nat_index);
        index
    }

    fn attribute(&mut self, name: &str, body: Vec<u8>) -> Vec<u8> {
        let name_index = self.utf8(name);
        let mut out = Vec::new();
        put_u2(&mut out, name_index);
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend(body);
        out
    }

    fn annotation_attributes(&mut self, annotations: &[Annotation]) -> Vec<Vec<u8>> {
        let mut attributes = Vec::new();
        for (visible, name) in [
            (true, "RuntimeVisibleAnnotations"),
            (false, "RuntimeInvisibleAnnotations"),
        ] {
            let selected: Vec<&Annotation> = annotations
                .iter()
                .filter(|annotation| annotation.visible == visible)
                .collect();
            if selected.is_empty() {
                continue;
            }
            let mut body = Vec::new();
            put_u2(&mut body, selected.len() as u16);
            for annotation in selected {
                self.encode_annotation(annotation, &mut body);
            }
            attributes.push(self.attribute(name, body));
        }
        attributes
    }

    fn encode_annotation(&mut self, annotation: &Annotation, out: &mut Vec<u8>) {
        let type_index = self.utf8(&annotation.descriptor);
        put_u2(out, type_index);
        put_u2(out, annotation.values.len() as u16);
        for (name, value) in &annotation.values {
            let name_index = self.utf8(name);
            put_u2(out, name_index);
            self.encode_value(value, out);
        }
    }

    fn encode_value(&mut self, value: &Value, out: &mut Vec<u8>) {
        match value {
            Value::Int(value) => {
                let index = self.integer(*value);
                out.push(b'I');
                put_u2(out, index);
            }
            Value::Str(value) => {
                let index = self.utf8(value);
                out.push(b's');
                put_u2(out, index);
            }
            Value::Enum {
                descriptor,
                constant,
            } => {
                let type_index = self.utf8(descriptor);
                let const_index = self.utf8(constant);
                out.push(b'e');
                put_u2(out, type_index);
                put_u2(out, const_index);
            }
            Value::Class(descriptor) => {
                let index = self.utf8(descriptor);
                out.push(b'c');
                put_u2(out, index);
            }
            Value::Nested(annotation) => {
                out.push(b'@');
                self.encode_annotation(annotation, out);
            }
            Value::Array(values) => {
                out.push(b'[');
                put_u2(out, values.len() as u16);
                for value in values {
                    self.encode_value(value, out);
                }
            }
            Value::Raw(tag) => {
                out.push(*tag);
                put_u2(out, 0);
            }
        }
    }

    fn code_attribute(&mut self, code: &[Insn]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for insn in code {
            self.encode_insn(insn, &mut bytes);
        }

        let mut body = Vec::new();
        put_u2(&mut body, 16); // max_stack
        put_u2(&mut body, 400); // max_locals
        body.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        body.extend(bytes);
        put_u2(&mut body, 0); // exception table

        let mut line_numbers = Vec::new();
        put_u2(&mut line_numbers, 1);
        put_u2(&mut line_numbers, 0);
        put_u2(&mut line_numbers, 1);
        let line_number_table = self.attribute("LineNumberTable", line_numbers);
        put_u2(&mut body, 1);
        body.extend(line_number_table);

        self.attribute("Code", body)
    }

    fn encode_insn(&mut self, insn: &Insn, out: &mut Vec<u8>) {
        match insn {
            Insn::Aload0 => out.push(0x2a),
            Insn::Pop => out.push(0x57),
            Insn::Return => out.push(0xb1),
            Insn::Areturn => out.push(0xb0),
            Insn::GetField {
                owner,
                name,
                descriptor,
            } => {
                let index = self.member_ref(9, owner, name, descriptor);
                out.push(0xb4);
                put_u2(out, index);
            }
            Insn::PutStatic {
                owner,
                name,
                descriptor,
            } => {
                let index = self.member_ref(9, owner, name, descriptor);
                out.push(0xb3);
                put_u2(out, index);
            }
            Insn::InvokeVirtual {
                owner,
                name,
                descriptor,
            } => {
                let index = self.member_ref(10, owner, name, descriptor);
                out.push(0xb6);
                put_u2(out, index);
            }
            Insn::InvokeStatic {
                owner,
                name,
                descriptor,
            } => {
                let index = self.member_ref(10, owner, name, descriptor);
                out.push(0xb8);
                put_u2(out, index);
            }
            Insn::InvokeInterface {
                owner,
                name,
                descriptor,
            } => {
                let index = self.member_ref(11, owner, name, descriptor);
                out.push(0xb9);
                put_u2(out, index);
                out.push(1);
                out.push(0);
            }
            Insn::InvokeDynamic { name, descriptor } => {
                let index = self.invoke_dynamic(name, descriptor);
                out.push(0xba);
                put_u2(out, index);
                put_u2(out, 0);
            }
            Insn::New(class) => {
                let index = self.class(class);
                out.push(0xbb);
                put_u2(out, index);
            }
            Insn::CheckCast(class) => {
                let index = self.class(class);
                out.push(0xc0);
                put_u2(out, index);
            }
            Insn::LdcClass(class) => {
                let index = self.class(class);
                out.push(0x13); // ldc_w
                put_u2(out, index);
            }
            Insn::MultiANewArray {
                descriptor,
                dimensions,
            } => {
                let index = self.class(descriptor);
                out.push(0xc5);
                put_u2(out, index);
                out.push(*dimensions);
            }
            Insn::TableSwitch => {
                out.push(0x03); // iconst_0
                let opcode_offset = out.len();
                out.push(0xaa);
                pad_switch(out, opcode_offset);
                let next = 4 + 4 * 4 + switch_padding(opcode_offset) as i32 + 1;
                out.extend_from_slice(&next.to_be_bytes()); // default
                out.extend_from_slice(&0i32.to_be_bytes()); // low
                out.extend_from_slice(&1i32.to_be_bytes()); // high
                out.extend_from_slice(&next.to_be_bytes());
                out.extend_from_slice(&next.to_be_bytes());
            }
            Insn::LookupSwitch => {
                out.push(0x03); // iconst_0
                let opcode_offset = out.len();
                out.push(0xab);
                pad_switch(out, opcode_offset);
                let next = 4 * 4 + switch_padding(opcode_offset) as i32 + 1;
                out.extend_from_slice(&next.to_be_bytes()); // default
                out.extend_from_slice(&1i32.to_be_bytes()); // npairs
                out.extend_from_slice(&7i32.to_be_bytes()); // match
                out.extend_from_slice(&next.to_be_bytes());
            }
            Insn::WideIinc => {
                out.push(0xc4);
                out.push(0x84);
                put_u2(out, 300);
                put_u2(out, 1000);
            }
        }
    }

    /// Adds a long constant, which occupies two pool slots.
    pub fn with_long_constant(mut self, value: i64) -> Self {
        self.long(value);
        self
    }
}

fn switch_padding(opcode_offset: usize) -> usize {
    (4 - (opcode_offset + 1) % 4) % 4
}

fn pad_switch(out: &mut Vec<u8>, opcode_offset: usize) {
    for _ in 0..switch_padding(opcode_offset) {
        out.push(0);
    }
}

fn put_u2(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Entries of a jar in write order.
#[derive(Debug, Clone, Default)]
pub struct JarBuilder {
    entries: Vec<(String, Option<Vec<u8>>)>,
}

impl JarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directory(mut self, name: &str) -> Self {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{name}/")
        };
        if !self.entries.iter().any(|(existing, _)| *existing == name) {
            self.entries.push((name, None));
        }
        self
    }

    pub fn file(mut self, name: &str, content: impl Into<Vec<u8>>) -> Self {
        self.entries.push((name.to_string(), Some(content.into())));
        self
    }

    /// Adds a class file along with directory entries for all its parent
    /// directories, the way the `jar` tool lays archives out.
    pub fn class(mut self, internal_name: &str, bytes: Vec<u8>) -> Self {
        let mut prefix = String::new();
        let segments: Vec<&str> = internal_name.split('/').collect();
        for segment in &segments[..segments.len() - 1] {
            prefix.push_str(segment);
            prefix.push('/');
            self = self.directory(&prefix);
        }
        self.file(&format!("{internal_name}.class"), bytes)
    }

    /// Adds a class file without any directory entries.
    pub fn bare_class(self, internal_name: &str, bytes: Vec<u8>) -> Self {
        self.file(&format!("{internal_name}.class"), bytes)
    }

    pub fn write(&self, path: &Path) {
        let file = File::create(path).expect("create jar");
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        for (name, content) in &self.entries {
            match content {
                None => zip.add_directory(name.as_str(), options).expect("add directory"),
                Some(bytes) => {
                    zip.start_file(name.as_str(), options).expect("start file");
                    zip.write_all(bytes).expect("write entry");
                }
            }
        }
        zip.finish().expect("finish jar");
    }

    pub fn write_into(&self, directory: &Path, file_name: &str) -> PathBuf {
        let path = directory.join(file_name);
        self.write(&path);
        path
    }
}

/// Jar whose single class references every type in `references` through
/// fields, plus marker classes for every package in `provides`.
pub fn jar_with(provides: &[&str], references: &[&str]) -> JarBuilder {
    let mut jar = JarBuilder::new();
    for package in provides {
        let path = package.replace('.', "/");
        jar = jar.class(
            &format!("{path}/Provided"),
            ClassFileBuilder::new(&format!("{path}/Provided")).build(),
        );
    }

    let mut user = ClassFileBuilder::new("zz/user/Consumer");
    for (index, reference) in references.iter().enumerate() {
        let descriptor = format!("L{};", reference.replace('.', "/"));
        user = user.field(&format!("field{index}"), &descriptor);
    }
    jar.class("zz/user/Consumer", user.build())
}

pub fn open(path: &Path) -> ArchiveDescriptor {
    ArchiveDescriptor::open(path, &AnalysisConfig::default()).expect("open archive")
}

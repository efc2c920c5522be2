//! Extraction of referenced type names from a single class file.
//!
//! The scanner walks every structural record of the class (header, fields,
//! methods, code bodies, attribute and annotation tables) in one pass and
//! feeds each type descriptor it meets to [`collect_descriptor_classes`].
//!
//! Only descriptor positions are collected: field types, descriptors of
//! invoked methods and accessed fields, `multianewarray` element types and
//! annotation types (including enum constants and nested annotations). The
//! superclass, implemented interfaces and the owner class of an invoked
//! method or accessed field are never collected.

use std::collections::BTreeSet;
use std::io::Read;

use super::descriptor::{collect_descriptor_classes, package_names};
use super::error::ClassParseError;
use super::reader::{ClassReader, ConstantPool};

const MAX_ELEMENT_DEPTH: usize = 256;

// Opcodes with operands the scanner inspects.
const TABLESWITCH: u8 = 0xaa;
const LOOKUPSWITCH: u8 = 0xab;
const GETSTATIC: u8 = 0xb2;
const INVOKESTATIC: u8 = 0xb8;
const INVOKEINTERFACE: u8 = 0xb9;
const INVOKEDYNAMIC: u8 = 0xba;
const WIDE: u8 = 0xc4;
const MULTIANEWARRAY: u8 = 0xc5;
const IINC: u8 = 0x84;

/// Returns the dotted names of every class referenced by descriptors in the
/// class file `bytes`, which must span exactly one class from start to end.
pub fn find_class_names(bytes: &[u8]) -> Result<BTreeSet<String>, ClassParseError> {
    let mut reader = ClassReader::new(bytes);
    reader.expect_magic()?;
    let _minor_version = reader.read_u2()?;
    let _major_version = reader.read_u2()?;
    let pool = ConstantPool::parse(&mut reader)?;

    let mut scanner = ReferenceScanner {
        pool: &pool,
        names: BTreeSet::new(),
    };
    scanner.scan_body(&mut reader)?;
    Ok(scanner.names)
}

/// Same as [`find_class_names`], reading the class from `input` until EOF.
pub fn find_class_names_from_reader<R: Read>(
    mut input: R,
) -> Result<BTreeSet<String>, ClassParseError> {
    let mut buffer = Vec::new();
    input.read_to_end(&mut buffer)?;
    find_class_names(&buffer)
}

/// Packages of the classes returned by [`find_class_names`].
pub fn find_package_names(bytes: &[u8]) -> Result<BTreeSet<String>, ClassParseError> {
    Ok(package_names(&find_class_names(bytes)?))
}

/// Same as [`find_package_names`], reading the class from `input` until EOF.
pub fn find_package_names_from_reader<R: Read>(
    input: R,
) -> Result<BTreeSet<String>, ClassParseError> {
    Ok(package_names(&find_class_names_from_reader(input)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Class,
    Field,
    Method,
}

struct ReferenceScanner<'p> {
    pool: &'p ConstantPool,
    names: BTreeSet<String>,
}

impl ReferenceScanner<'_> {
    fn collect(&mut self, descriptor: &str) {
        collect_descriptor_classes(descriptor, &mut self.names);
    }

    fn collect_utf8(&mut self, index: u16) -> Result<(), ClassParseError> {
        let pool = self.pool;
        collect_descriptor_classes(pool.utf8(index)?, &mut self.names);
        Ok(())
    }

    fn scan_body(&mut self, reader: &mut ClassReader<'_>) -> Result<(), ClassParseError> {
        let _access_flags = reader.read_u2()?;
        let _this_class = reader.read_u2()?;
        let _super_class = reader.read_u2()?;
        let interfaces_count = reader.read_u2()?;
        reader.skip(interfaces_count as usize * 2)?;

        let fields_count = reader.read_u2()?;
        for _ in 0..fields_count {
            let _access_flags = reader.read_u2()?;
            let _name_index = reader.read_u2()?;
            let descriptor_index = reader.read_u2()?;
            self.collect_utf8(descriptor_index)?;
            self.scan_attributes(reader, Owner::Field)?;
        }

        let methods_count = reader.read_u2()?;
        for _ in 0..methods_count {
            let _access_flags = reader.read_u2()?;
            let _name_index = reader.read_u2()?;
            // The declared signature itself is not a reference source.
            let _descriptor_index = reader.read_u2()?;
            self.scan_attributes(reader, Owner::Method)?;
        }

        self.scan_attributes(reader, Owner::Class)
    }

    fn scan_attributes(
        &mut self,
        reader: &mut ClassReader<'_>,
        owner: Owner,
    ) -> Result<(), ClassParseError> {
        let attributes_count = reader.read_u2()?;
        for _ in 0..attributes_count {
            let name_index = reader.read_u2()?;
            let length = reader.read_u4()? as usize;
            let body = reader.read_slice(length)?;
            let mut body = ClassReader::new(body);

            match (self.pool.utf8(name_index)?, owner) {
                ("RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations", _) => {
                    self.scan_annotations(&mut body, 0)?;
                }
                (
                    "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations",
                    Owner::Method,
                ) => {
                    let parameters = body.read_u1()?;
                    for _ in 0..parameters {
                        self.scan_annotations(&mut body, 0)?;
                    }
                }
                ("AnnotationDefault", Owner::Method) => {
                    self.scan_element_value(&mut body, 0)?;
                }
                ("Code", Owner::Method) => self.scan_code_attribute(&mut body)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn scan_annotations(
        &mut self,
        reader: &mut ClassReader<'_>,
        depth: usize,
    ) -> Result<(), ClassParseError> {
        let count = reader.read_u2()?;
        for _ in 0..count {
            self.scan_annotation(reader, depth)?;
        }
        Ok(())
    }

    fn scan_annotation(
        &mut self,
        reader: &mut ClassReader<'_>,
        depth: usize,
    ) -> Result<(), ClassParseError> {
        if depth > MAX_ELEMENT_DEPTH {
            return Err(ClassParseError::NestingTooDeep {
                limit: MAX_ELEMENT_DEPTH,
            });
        }
        let type_index = reader.read_u2()?;
        self.collect_utf8(type_index)?;

        let pairs = reader.read_u2()?;
        for _ in 0..pairs {
            let _element_name_index = reader.read_u2()?;
            self.scan_element_value(reader, depth + 1)?;
        }
        Ok(())
    }

    fn scan_element_value(
        &mut self,
        reader: &mut ClassReader<'_>,
        depth: usize,
    ) -> Result<(), ClassParseError> {
        if depth > MAX_ELEMENT_DEPTH {
            return Err(ClassParseError::NestingTooDeep {
                limit: MAX_ELEMENT_DEPTH,
            });
        }
        let tag = reader.read_u1()?;
        match tag {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => reader.skip(2)?,
            // Class literals are values, not annotation types.
            b'c' => reader.skip(2)?,
            b'e' => {
                let type_name_index = reader.read_u2()?;
                let _const_name_index = reader.read_u2()?;
                self.collect_utf8(type_name_index)?;
            }
            b'@' => self.scan_annotation(reader, depth + 1)?,
            b'[' => {
                let values = reader.read_u2()?;
                for _ in 0..values {
                    self.scan_element_value(reader, depth + 1)?;
                }
            }
            other => return Err(ClassParseError::InvalidElementValue { tag: other }),
        }
        Ok(())
    }

    fn scan_code_attribute(&mut self, reader: &mut ClassReader<'_>) -> Result<(), ClassParseError> {
        let _max_stack = reader.read_u2()?;
        let _max_locals = reader.read_u2()?;
        let code_length = reader.read_u4()? as usize;
        let code = reader.read_slice(code_length)?;
        self.scan_code(code)?;

        let exception_table_length = reader.read_u2()?;
        reader.skip(exception_table_length as usize * 8)?;

        // LineNumberTable, LocalVariableTable, StackMapTable, ... carry no
        // reference sources; they are only checked for structure.
        let attributes_count = reader.read_u2()?;
        for _ in 0..attributes_count {
            let _name_index = reader.read_u2()?;
            let length = reader.read_u4()? as usize;
            reader.skip(length)?;
        }
        Ok(())
    }

    fn scan_code(&mut self, code: &[u8]) -> Result<(), ClassParseError> {
        let mut reader = ClassReader::new(code);
        while reader.remaining() > 0 {
            let offset = reader.position();
            let opcode = reader.read_u1()?;
            match opcode {
                0x00..=0x0f
                | 0x1a..=0x35
                | 0x3b..=0x83
                | 0x85..=0x98
                | 0xac..=0xb1
                | 0xbe
                | 0xbf
                | 0xc2
                | 0xc3 => {}
                0x10 | 0x12 | 0x15..=0x19 | 0x36..=0x3a | 0xa9 | 0xbc => reader.skip(1)?,
                0x11 | 0x13 | 0x14 | IINC | 0x99..=0xa8 | 0xbb | 0xbd | 0xc0 | 0xc1 | 0xc6
                | 0xc7 => reader.skip(2)?,
                0xc8 | 0xc9 => reader.skip(4)?,
                GETSTATIC..=INVOKESTATIC => {
                    let index = reader.read_u2()?;
                    let pool = self.pool;
                    self.collect(pool.member_descriptor(index)?);
                }
                INVOKEINTERFACE => {
                    let index = reader.read_u2()?;
                    reader.skip(2)?; // count, 0
                    let pool = self.pool;
                    self.collect(pool.member_descriptor(index)?);
                }
                INVOKEDYNAMIC => {
                    let index = reader.read_u2()?;
                    reader.skip(2)?; // 0, 0
                    let pool = self.pool;
                    self.collect(pool.dynamic_descriptor(index)?);
                }
                MULTIANEWARRAY => {
                    let index = reader.read_u2()?;
                    let _dimensions = reader.read_u1()?;
                    let pool = self.pool;
                    self.collect(pool.class_name(index)?);
                }
                TABLESWITCH => {
                    skip_switch_padding(&mut reader, offset)?;
                    let _default = reader.read_i4()?;
                    let low = reader.read_i4()? as i64;
                    let high = reader.read_i4()? as i64;
                    if high < low {
                        return Err(ClassParseError::InvalidOpcode { opcode, offset });
                    }
                    reader.skip(((high - low + 1) * 4) as usize)?;
                }
                LOOKUPSWITCH => {
                    skip_switch_padding(&mut reader, offset)?;
                    let _default = reader.read_i4()?;
                    let pairs = reader.read_i4()?;
                    if pairs < 0 {
                        return Err(ClassParseError::InvalidOpcode { opcode, offset });
                    }
                    reader.skip(pairs as usize * 8)?;
                }
                WIDE => match reader.read_u1()? {
                    IINC => reader.skip(4)?,
                    0x15..=0x19 | 0x36..=0x3a | 0xa9 => reader.skip(2)?,
                    other => {
                        return Err(ClassParseError::InvalidOpcode {
                            opcode: other,
                            offset: offset + 1,
                        })
                    }
                },
                other => return Err(ClassParseError::InvalidOpcode { opcode: other, offset }),
            }
        }
        Ok(())
    }
}

/// Switch operands start at the next offset that is a multiple of four,
/// counted from the start of the code array.
fn skip_switch_padding(
    reader: &mut ClassReader<'_>,
    opcode_offset: usize,
) -> Result<(), ClassParseError> {
    let padding = (4 - (opcode_offset + 1) % 4) % 4;
    reader.skip(padding)
}

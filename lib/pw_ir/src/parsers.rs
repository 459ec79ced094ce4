use crate::classes::*;
use crate::errors::{IrError, IrResult};
use crate::fields::*;
use crate::locals::*;
use crate::methods::*;
use crate::stmts::*;
use crate::types::*;
use crate::{Addr, Program};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, map, opt, recognize, value};
use nom::error::{ErrorKind, ParseError};
use nom::multi::{many0, separated_list0, separated_list1};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated, tuple};
use nom::{Finish, IResult};

// The program text is line oriented: every line is parsed on its own by one
// of the three line parsers (top-level, class member, method body) and the
// `ProgramBuilder` keeps track of the enclosing blocks.

/// Program parsing function, takes the IR text and returns a freshly built [`Program`].
pub fn parse_program(input: &str) -> IrResult<Program> {
    log::trace!("parsing program...");

    let mut builder = ProgramBuilder::default();
    for (i, raw_line) in input.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        builder.feed(line).map_err(|err| err.at_line(i + 1))?;
    }
    let program = builder.finish()?;

    log::debug!(
        "parsed {} classes, {} methods",
        program.nb_classes(),
        program.nb_methods()
    );
    Ok(program)
}

#[derive(Debug)]
enum TopLevelLine {
    Class(ClassDef),
    Entry(MethodRef),
}

#[derive(Debug, Clone)]
enum MemberLine {
    Field(FieldDef),
    Method(MethodDef),
    End,
}

#[derive(Debug, Clone)]
enum BodyLine {
    Stmt(Stmt),
    MoveResult(Local),
    End,
}

#[derive(Default)]
struct ProgramBuilder {
    program: Program,
    class: Option<ClassDef>,
    method: Option<MethodDef>,
}

impl ProgramBuilder {
    fn feed(&mut self, line: &str) -> IrResult<()> {
        if self.method.is_some() {
            let (_, parsed) = all_consuming(body_line)(line).finish()?;
            if let BodyLine::End = parsed {
                let method = self
                    .method
                    .take()
                    .ok_or_else(|| IrError::Internal("no method to close".to_string()))?;
                self.current_class()?.methods.push(method);
                return Ok(());
            }
            let code = self
                .method
                .as_mut()
                .and_then(|method| method.code.as_mut())
                .ok_or_else(|| IrError::Internal("method body without code".to_string()))?;
            match parsed {
                BodyLine::Stmt(stmt) => {
                    if let Stmt::Invoke(invoke) = &stmt {
                        if invoke.kind().has_receiver() && invoke.args.is_empty() {
                            return Err(IrError::Structure(format!(
                                "missing receiver for {}",
                                invoke.method()
                            )));
                        }
                    }
                    let addr = Addr(code.stmts.len());
                    code.stmts.push(LabeledStmt { addr, stmt });
                }
                BodyLine::MoveResult(local) => match code.stmts.last_mut() {
                    Some(LabeledStmt {
                        stmt: Stmt::Invoke(invoke),
                        ..
                    }) if invoke.result().is_none() => invoke.set_result(local),
                    _ => {
                        return Err(IrError::Structure(
                            "move-result must directly follow an invocation".to_string(),
                        ))
                    }
                },
                BodyLine::End => (),
            }
            return Ok(());
        }

        if self.class.is_some() {
            let (_, parsed) = all_consuming(member_line)(line).finish()?;
            match parsed {
                MemberLine::Field(field) => self.current_class()?.fields.push(field),
                MemberLine::Method(mut method) => {
                    if method.is_abstract() || method.is_native() {
                        self.current_class()?.methods.push(method);
                    } else {
                        method.code = Some(Code::default());
                        self.method = Some(method);
                    }
                }
                MemberLine::End => {
                    let class = self
                        .class
                        .take()
                        .ok_or_else(|| IrError::Internal("no class to close".to_string()))?;
                    self.program.classes.push(class);
                }
            }
            return Ok(());
        }

        let (_, parsed) = all_consuming(toplevel_line)(line).finish()?;
        match parsed {
            TopLevelLine::Class(class) => self.class = Some(class),
            TopLevelLine::Entry(method) => {
                if let Some(entry) = &self.program.entry {
                    return Err(IrError::Structure(format!(
                        "entry already declared as {entry}"
                    )));
                }
                self.program.entry = Some(method);
            }
        }
        Ok(())
    }

    fn current_class(&mut self) -> IrResult<&mut ClassDef> {
        self.class
            .as_mut()
            .ok_or_else(|| IrError::Structure("member declared outside of a class".to_string()))
    }

    fn finish(self) -> IrResult<Program> {
        if let Some(method) = &self.method {
            return Err(IrError::Structure(format!(
                "unterminated method {}",
                method.name()
            )));
        }
        if let Some(class) = &self.class {
            return Err(IrError::Structure(format!(
                "unterminated class {}",
                class.class_name()
            )));
        }
        Ok(self.program)
    }
}

// Removes a trailing `#` comment, ignoring `#` inside string literals.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => (),
        }
    }
    line
}

fn ident(input: &str) -> IResult<&str, &str, IrError> {
    take_while1(|c: char| c.is_alphanumeric() || "_$/<>".contains(c))(input)
}

fn kw<'a>(keyword: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, IrError> {
    terminated(tag(keyword), space1)
}

fn comma(input: &str) -> IResult<&str, char, IrError> {
    delimited(space0, char(','), space0)(input)
}

fn local(input: &str) -> IResult<&str, Local, IrError> {
    map(ident, Local::from)(input)
}

fn typ(input: &str) -> IResult<&str, Type, IrError> {
    let (rest, descr) = recognize(pair(ident, many0(tag("[]"))))(input)?;
    let t = Type::try_from(descr).map_err(nom::Err::Failure)?;
    Ok((rest, t))
}

fn integer(input: &str) -> IResult<&str, i64, IrError> {
    let (rest, digits) = recognize(pair(opt(char('-')), digit1))(input)?;
    let value = digits.parse::<i64>().map_err(|_| {
        nom::Err::Failure(IrError::Parsing(digits.to_string(), ErrorKind::Digit))
    })?;
    Ok((rest, value))
}

fn string_literal(input: &str) -> IResult<&str, String, IrError> {
    let (body, _) = char('"')(input)?;
    let mut lit = String::new();
    let mut chars = body.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((&body[i + 1..], lit)),
            '\\' => match chars.next() {
                Some((_, 'n')) => lit.push('\n'),
                Some((_, 't')) => lit.push('\t'),
                Some((_, escaped)) => lit.push(escaped),
                None => break,
            },
            c => lit.push(c),
        }
    }
    Err(nom::Err::Error(IrError::from_error_kind(
        input,
        ErrorKind::Char,
    )))
}

fn method_ref(input: &str) -> IResult<&str, MethodRef, IrError> {
    map(separated_pair(ident, tag("->"), ident), |(class, name)| {
        MethodRef::new(class, name)
    })(input)
}

fn field_ref(input: &str) -> IResult<&str, FieldRef, IrError> {
    map(separated_pair(ident, tag("->"), ident), |(class, name)| {
        FieldRef::new(class, name)
    })(input)
}

fn toplevel_line(input: &str) -> IResult<&str, TopLevelLine, IrError> {
    alt((
        map(preceded(kw("entry"), method_ref), TopLevelLine::Entry),
        map(class_header, TopLevelLine::Class),
    ))(input)
}

fn class_header(input: &str) -> IResult<&str, ClassDef, IrError> {
    let (rest, (is_abstract, keyword, name)) = tuple((
        opt(kw("abstract")),
        terminated(alt((tag("class"), tag("interface"))), space1),
        ident,
    ))(input)?;
    let (rest, extends) = opt(preceded(
        tuple((space1, tag("extends"), space1)),
        separated_list1(comma, ident),
    ))(rest)?;
    let (rest, implements) = opt(preceded(
        tuple((space1, tag("implements"), space1)),
        separated_list1(comma, ident),
    ))(rest)?;

    let mut flags = ClassFlags::empty();
    if is_abstract.is_some() {
        flags |= ClassFlags::ACC_ABSTRACT;
    }
    let mut class = if keyword == "interface" {
        if implements.is_some() {
            return Err(nom::Err::Failure(IrError::Structure(format!(
                "interface {name} cannot implement interfaces"
            ))));
        }
        let mut class = ClassDef::new(
            name,
            flags | ClassFlags::ACC_INTERFACE | ClassFlags::ACC_ABSTRACT,
        );
        class.interfaces = extends
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        class
    } else {
        let mut class = ClassDef::new(name, flags);
        if let Some(extends) = extends {
            if extends.len() > 1 {
                return Err(nom::Err::Failure(IrError::Structure(format!(
                    "class {name} extends more than one class"
                ))));
            }
            class.superclass = extends.first().map(|s| s.to_string());
        }
        class
    };
    if let Some(interfaces) = implements {
        class.interfaces = interfaces.into_iter().map(str::to_string).collect();
    }
    Ok((rest, class))
}

fn member_line(input: &str) -> IResult<&str, MemberLine, IrError> {
    alt((
        value(MemberLine::End, tag("end")),
        map(field_decl, MemberLine::Field),
        map(method_header, MemberLine::Method),
    ))(input)
}

fn field_decl(input: &str) -> IResult<&str, FieldDef, IrError> {
    map(
        pair(opt(kw("static")), preceded(kw("field"), ident)),
        |(is_static, name)| {
            let flags = if is_static.is_some() {
                FieldFlags::ACC_STATIC
            } else {
                FieldFlags::empty()
            };
            FieldDef::new(name, flags)
        },
    )(input)
}

fn param(input: &str) -> IResult<&str, Param, IrError> {
    map(
        pair(local, opt(preceded(delimited(space0, char(':'), space0), typ))),
        |(local, typ)| Param::new(local, typ),
    )(input)
}

fn method_header(input: &str) -> IResult<&str, MethodDef, IrError> {
    let (rest, (modifiers, name, params)) = tuple((
        many0(terminated(
            alt((tag("static"), tag("abstract"), tag("native"))),
            space1,
        )),
        preceded(kw("method"), ident),
        preceded(
            space0,
            delimited(
                pair(char('('), space0),
                separated_list0(comma, param),
                pair(space0, char(')')),
            ),
        ),
    ))(input)?;

    let mut flags = MethodFlags::empty();
    for modifier in modifiers {
        flags |= match modifier {
            "static" => MethodFlags::ACC_STATIC,
            "abstract" => MethodFlags::ACC_ABSTRACT,
            _ => MethodFlags::ACC_NATIVE,
        };
    }
    if params.iter().any(|p| p.local().is_this()) {
        return Err(nom::Err::Failure(IrError::Structure(format!(
            "method {name} declares a parameter named '{THIS}'"
        ))));
    }
    Ok((rest, MethodDef::new(name, flags, params)))
}

fn body_line(input: &str) -> IResult<&str, BodyLine, IrError> {
    alt((
        value(BodyLine::End, tag("end")),
        map(preceded(kw("move-result"), local), BodyLine::MoveResult),
        map(stmt, BodyLine::Stmt),
    ))(input)
}

fn invoke_kind(input: &str) -> IResult<&str, InvokeKind, IrError> {
    terminated(
        alt((
            value(InvokeKind::Static, tag("invoke-static")),
            value(InvokeKind::Direct, tag("invoke-direct")),
            value(InvokeKind::Super, tag("invoke-super")),
            value(InvokeKind::Virtual, tag("invoke-virtual")),
            value(InvokeKind::Interface, tag("invoke-interface")),
        )),
        space1,
    )(input)
}

fn invoke(input: &str) -> IResult<&str, Invoke, IrError> {
    map(
        tuple((
            invoke_kind,
            delimited(
                pair(char('{'), space0),
                separated_list0(comma, local),
                pair(space0, char('}')),
            ),
            preceded(comma, method_ref),
        )),
        |(kind, args, method)| Invoke::new(kind, args, method),
    )(input)
}

fn stmt(input: &str) -> IResult<&str, Stmt, IrError> {
    alt((
        value(Stmt::Nop, tag("nop")),
        value(Stmt::ReturnVoid, tag("return-void")),
        map(preceded(kw("return"), local), Stmt::Return),
        map(
            preceded(kw("const-string"), separated_pair(local, comma, string_literal)),
            |(dst, lit)| Stmt::ConstString(dst, lit),
        ),
        map(
            preceded(kw("const"), separated_pair(local, comma, integer)),
            |(dst, value)| Stmt::Const(dst, value),
        ),
        map(
            preceded(kw("new-instance"), separated_pair(local, comma, typ)),
            |(dst, t)| Stmt::NewInstance(dst, t),
        ),
        map(
            preceded(kw("new-array"), separated_pair(local, comma, typ)),
            |(dst, t)| Stmt::NewArray(dst, t),
        ),
        map(
            preceded(kw("move"), separated_pair(local, comma, local)),
            |(dst, src)| Stmt::Move(dst, src),
        ),
        map(
            preceded(kw("iget"), tuple((local, comma, local, comma, field_ref))),
            |(dst, _, obj, _, field)| Stmt::Iget(dst, obj, field),
        ),
        map(
            preceded(kw("iput"), tuple((local, comma, local, comma, field_ref))),
            |(src, _, obj, _, field)| Stmt::Iput(src, obj, field),
        ),
        map(
            preceded(kw("sget"), separated_pair(local, comma, field_ref)),
            |(dst, field)| Stmt::Sget(dst, field),
        ),
        map(
            preceded(kw("sput"), separated_pair(local, comma, field_ref)),
            |(src, field)| Stmt::Sput(src, field),
        ),
        map(
            preceded(kw("aget"), separated_pair(local, comma, local)),
            |(dst, arr)| Stmt::Aget(dst, arr),
        ),
        map(
            preceded(kw("aput"), separated_pair(local, comma, local)),
            |(src, arr)| Stmt::Aput(src, arr),
        ),
        map(invoke, Stmt::Invoke),
    ))(input)
}

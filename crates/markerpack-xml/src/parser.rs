//! Recursive-descent overlay XML parser.

use memchr::memmem;

use crate::{decode_entities, Error, Result, XmlAttribute, XmlNode};

/// Deepest element nesting accepted before the parse is rejected.
const MAX_DEPTH: usize = 256;

/// Options controlling how names are normalized.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserSettings {
    /// Prefixes stripped (case-insensitively) from element and attribute names.
    pub vendor_prefixes: Vec<String>,
}

impl ParserSettings {
    /// Add a vendor prefix to strip.
    pub fn with_vendor_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.vendor_prefixes.push(prefix.into());
        self
    }

    /// Normalize an element or attribute name.
    ///
    /// The first matching vendor prefix is removed, then the name is
    /// lower-cased.
    pub fn clean_name(&self, name: &str) -> String {
        for prefix in self.vendor_prefixes.iter().filter(|p| !p.is_empty()) {
            let matches = name
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix));

            if matches {
                return name[prefix.len()..].to_lowercase();
            }
        }

        name.to_lowercase()
    }
}

/// A parsed overlay document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlNode,
    declarations: Vec<XmlAttribute>,
}

impl XmlDocument {
    /// Create a document from an existing root element.
    pub fn new(root: XmlNode) -> Self {
        Self {
            root,
            declarations: Vec::new(),
        }
    }

    /// Parse a document with default settings.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, &ParserSettings::default())
    }

    /// Parse a document.
    ///
    /// # Arguments
    ///
    /// * `text` - The raw document text
    /// * `settings` - Name normalization options
    ///
    /// # Returns
    ///
    /// The root element and the prolog declarations, or an error if any part
    /// of the document is malformed.
    pub fn parse_with(text: &str, settings: &ParserSettings) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        Parser::new(text, settings).parse_document()
    }

    /// Get the root element.
    #[inline]
    pub fn root(&self) -> &XmlNode {
        &self.root
    }

    /// Get mutable access to the root element.
    #[inline]
    pub fn root_mut(&mut self) -> &mut XmlNode {
        &mut self.root
    }

    /// Consume the document and return the root element.
    #[inline]
    pub fn into_root(self) -> XmlNode {
        self.root
    }

    /// Attributes of every `<?...?>` declaration in the prolog.
    #[inline]
    pub fn declarations(&self) -> &[XmlAttribute] {
        &self.declarations
    }
}

struct Parser<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    settings: &'a ParserSettings,
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
fn is_name_end(b: u8) -> bool {
    is_space(b) || matches!(b, b'/' | b'>' | b'=' | b'?')
}

impl<'a> Parser<'a> {
    fn new(src: &'a str, settings: &'a ParserSettings) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            settings,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    #[inline]
    fn at(&self, token: &str) -> bool {
        self.bytes[self.pos.min(self.bytes.len())..].starts_with(token.as_bytes())
    }

    fn current_char(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or('\0')
    }

    fn eof(&self, context: &'static str) -> Error {
        Error::UnexpectedEof {
            context,
            position: self.pos,
        }
    }

    fn expect(&mut self, byte: u8, expected: &'static str) -> Result<()> {
        match self.peek() {
            Some(b) if b == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => Err(Error::UnexpectedToken {
                expected,
                found: self.current_char(),
                position: self.pos,
            }),
            None => Err(self.eof(expected)),
        }
    }

    /// Find `needle` at or after the cursor, returning its absolute offset.
    fn find(&self, needle: &str) -> Option<usize> {
        memmem::find(&self.bytes[self.pos..], needle.as_bytes()).map(|i| self.pos + i)
    }

    /// Skip whitespace and any comments interleaved with it.
    fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            while self.peek().is_some_and(is_space) {
                self.pos += 1;
            }

            if !self.at("<!--") {
                return Ok(());
            }
            self.skip_comment()?;
        }
    }

    fn skip_comment(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 4;
        let end = self
            .find("-->")
            .ok_or(Error::UnterminatedComment { position: start })?;
        self.pos = end + 3;
        Ok(())
    }

    /// Skip past the next occurrence of `terminator`.
    fn skip_past(&mut self, terminator: &str, context: &'static str) -> Result<()> {
        let end = self.find(terminator).ok_or_else(|| self.eof(context))?;
        self.pos = end + terminator.len();
        Ok(())
    }

    fn read_name(&mut self) -> Result<&'a str> {
        let start = self.pos;
        while self.peek().is_some_and(|b| !is_name_end(b)) {
            self.pos += 1;
        }

        if self.pos == start {
            return match self.peek() {
                Some(_) => Err(Error::UnexpectedToken {
                    expected: "a name",
                    found: self.current_char(),
                    position: self.pos,
                }),
                None => Err(self.eof("name")),
            };
        }

        Ok(&self.src[start..self.pos])
    }

    fn parse_document(mut self) -> Result<XmlDocument> {
        let mut declarations = Vec::new();

        loop {
            self.skip_whitespace()?;

            match self.peek() {
                None => return Err(Error::MissingRoot),
                Some(b'<') => {}
                Some(_) => {
                    return Err(Error::UnexpectedToken {
                        expected: "'<'",
                        found: self.current_char(),
                        position: self.pos,
                    })
                }
            }

            if self.at("<?") {
                self.pos += 2;
                self.read_name()?;
                declarations.extend(self.parse_attributes()?);
                self.skip_whitespace()?;
                self.expect(b'?', "'?>'")?;
                self.expect(b'>', "'?>'")?;
                continue;
            }

            if self.at("<!") {
                self.skip_past(">", "doctype")?;
                continue;
            }

            let root = self.parse_element(0)?;

            // Anything after the root element is ignored.
            return Ok(XmlDocument { root, declarations });
        }
    }

    fn parse_attributes(&mut self) -> Result<Vec<XmlAttribute>> {
        let mut attributes = Vec::new();

        loop {
            self.skip_whitespace()?;

            match self.peek() {
                None => return Err(self.eof("attribute list")),
                Some(b'/' | b'>' | b'?') => return Ok(attributes),
                Some(_) => {}
            }

            let raw_name = self.read_name()?;
            let name = self.settings.clean_name(raw_name);

            self.skip_whitespace()?;
            self.expect(b'=', "'=' after attribute name")?;
            self.skip_whitespace()?;

            let quote = match self.peek() {
                Some(q @ (b'"' | b'\'')) => q,
                Some(_) => {
                    return Err(Error::UnquotedAttribute {
                        name,
                        position: self.pos,
                    })
                }
                None => return Err(self.eof("attribute value")),
            };

            let value_start = self.pos + 1;
            let value_end = memchr::memchr(quote, &self.bytes[value_start..])
                .map(|i| value_start + i)
                .ok_or(Error::UnterminatedAttribute {
                    name: name.clone(),
                    position: self.pos,
                })?;

            let value = decode_entities(&self.src[value_start..value_end]).into_owned();
            self.pos = value_end + 1;

            attributes.push(XmlAttribute { name, value });
        }
    }

    fn parse_element(&mut self, depth: usize) -> Result<XmlNode> {
        let start = self.pos;
        if depth >= MAX_DEPTH {
            return Err(Error::NestingTooDeep {
                depth: MAX_DEPTH,
                position: start,
            });
        }

        self.expect(b'<', "'<'")?;
        let name = self.settings.clean_name(self.read_name()?);
        let attributes = self.parse_attributes()?;

        let mut node = XmlNode {
            name,
            attributes,
            ..XmlNode::default()
        };

        if self.at("/>") {
            self.pos += 2;
            return Ok(node);
        }
        self.expect(b'>', "'>' or '/>'")?;

        let mut text = String::new();

        loop {
            let Some(lt) = memchr::memchr(b'<', &self.bytes[self.pos..]).map(|i| self.pos + i)
            else {
                return Err(Error::UnterminatedElement {
                    name: node.name,
                    position: start,
                });
            };

            let run = &self.src[self.pos..lt];
            if !run.trim().is_empty() {
                text.push_str(&decode_entities(run));
            }
            self.pos = lt;

            if self.at("<!--") {
                self.skip_comment()?;
            } else if self.at("<![CDATA[") {
                let body_start = self.pos + 9;
                self.pos = body_start;
                self.skip_past("]]>", "CDATA section")?;
                text.push_str(&self.src[body_start..self.pos - 3]);
            } else if self.at("<?") {
                self.skip_past("?>", "processing instruction")?;
            } else if self.at("</") {
                let close_at = self.pos;
                self.pos += 2;
                let closing = self.settings.clean_name(self.read_name()?);
                self.skip_whitespace()?;
                self.expect(b'>', "'>' after closing tag")?;

                if closing != node.name {
                    return Err(Error::MismatchedClosingTag {
                        expected: node.name,
                        found: closing,
                        position: close_at,
                    });
                }
                break;
            } else if self.at("<!") {
                self.skip_past(">", "markup declaration")?;
            } else {
                node.children.push(self.parse_element(depth + 1)?);
            }
        }

        node.text = text.trim().to_string();
        Ok(node)
    }
}

//! Token patterns for free-text address scanning.
//!
//! Icelandic street names are compound words whose last element is
//! drawn from a fairly small vocabulary (`-vegur`, `-gata`, `-braut`,
//! `-stígur`, `-tún` and their inflections). Matching on the ending
//! recognizes street names without a street list.

use regex::Regex;
use std::sync::LazyLock;

/// Street name endings in any grammatical case, anchored at the end of
/// the token.
#[rustfmt::skip]
static STREET_ENDING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(((hjálei|brin)g|bryggj|kirkj|s(kemm|eyl|tof|íð)|le(ir|ys))[au]|afréttu[mr]|(h(jallu|am(ra|a)|e(iða|lli)|ólmu|óla)|fjörðu|t(jarn|rað)i|(sveig|naut|teig|dal|læk)u|b(org|rún)i|(heim|krók)a|garð[au]|s(kóga|and[au]|tað[iu])|lauga|(graf|flat|sal)i|eyra|mela|aku|kó)r|(brunn|hvamm|stekk|[bk]lett|kamb|lund|reit|núp)(ur|i)|(dran|stí)g(ur|i)|(s((kerj|töp)u|kálu|ö(nd|l)u)|b(org|rún)u|h(eið|ól)u|(bö(kk|l)|g(röf|örð)|hömr)u|laugu|eyru|endu|kofu)m|(f(jöll|löt)|stöð|fold|lönd)um|tjörnum|(brekk|tung)(u[mr]?|a)|h(e(ll(um|a)|iði)|vilft|jall[ai]|amri|úsið|ólm[ai]|óll|öfn)|s(t(einn|api)|k((er|ál)i|ógi)|andi)|(strö|gru)nd|(hverf|stræ[tð]|(ger|s[tv]æ)ð|firð|eng|bæl|mýr|akr)i|((ba(kk|l)|mó)a|s(kál|tap)a|e(yj|nd)a|kofa)r|(grand|geisl|h(öfð|ag)|k(rik|im)|s(kól|már)|tang|múl|fló|rim)[ai]|((heim|krók)u|skógu|melu)[mr]|v(ellir|(an|o)g(ur|i)|ö(tnum|llu[mr]|r)|iður|eg(ur|i)|it[ai]|ík)|(h(úsin|löð)|göt)u|(h(varf|o(lt|f))|s(karð|el)|f(j(all|ós)|ell|oss)|(h(rau|or)|ló|tú)n|(bar|hli)ð|(hál|ne)s|sund|land|torg|vatn|ból|kot|gil)i|b(ja|e)rgi|h(ellu|úsi?|ól)|s(t(ein|að)|k(er|ál))|(ba(kk|l)|mó)a|s(kál|tap)a|sveig|f(jöll|löt)|tjörn|v(elli|ötn|ið)|h(varf|o(lt|f))|s(karð|el)|f(j(all|ós)|ell|oss)|(h(rau|or)|ló|tú)n|b(ja|e)rg|eyris|b(jörg|aki|ær|ót)|braut|(heim|krók)i|garði|(ba(kk|l)|mó)i|(hlað|gat|ald)a|fj(ara|öru)|l(ei(ti|ð)|aut|ind)|(b(rei|ygg|ú)|h(lí|æ)|s[lt]ó)ð|t(orf[au]|r(aða|öð))|jekdu|þ(ingi?|úf(u[mr]?|a))|ey(ri)?|b(org|rún?|ak|æ)|laug|e(yj|nd)a|kofa|naut|teig|stöð|fold|lönd|(bar|hli)ð|(hál|ne)s|sund|land|torg|vatn|endi|k(ofi|inn|lif)|mörk|öldu|mel|dal|læk|ból|kot|gil|ás)$").expect("valid regex")
});

/// Every valid Icelandic postcode.
#[rustfmt::skip]
static POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(1(0[1-57-9]|1[0-36]|6[12])|2(0[0136]|3[035]|6[02])|34[0-25]|5(1[0-2]|2[04])|27[016]|6(0[013-7]|1[016])|(24|35|4[26]|5[46]|6[278])[0156]|(22|64)[015]|7([356][0156]|[18][015])|41[056]|(19|25|3[0178]|4[0357]|5[358]|69|7[024])[01]|8(0[013-6]|2[05]|[14][056]|[5-8][01])|(17|21|3[26]|5[07]|6[356])0|900)$").expect("valid regex")
});

/// Optional digit followed by an optional word character. Both parts are
/// optional, so every token passes; house numbers are whatever is left
/// after streets and postcodes have been recognized.
static HOUSE_NR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\d+]?[\w+]?").expect("valid regex"));

/// Returns `true` if the token ends like an Icelandic street name.
#[must_use]
pub fn is_street(token: &str) -> bool {
    STREET_ENDING_RE.is_match(token)
}

/// Returns `true` if the token is a valid postcode.
#[must_use]
pub fn is_postcode(token: &str) -> bool {
    POSTCODE_RE.is_match(token)
}

/// Returns `true` if the token may be a house number.
#[must_use]
pub fn is_house_nr(token: &str) -> bool {
    HOUSE_NR_RE.is_match(token)
}
